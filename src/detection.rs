//! # Table Region Detection
//!
//! Finds the rectangles of a page that hold ruled tables. Two strategies sit
//! behind the [`TableDetector`] trait and are picked by [`DetectionMode`]:
//!
//! - **Contour area** (default): fixed-level binarization, then the outer
//!   contours whose bounding boxes are large enough to be a table.
//! - **Line intersection**: long horizontal and vertical strokes are isolated
//!   separately; a connected group of strokes that crosses itself at least
//!   once is a table. Useful when text or logos touch the table border.
//!   Boxing the AND of the two stroke masks would only yield the junction
//!   blobs, which never reach the minimum table size. The detector instead
//!   boxes the components of the OR mask that contain at least one junction
//!   pixel, and the size filter applies to those boxes.
//!
//! Nested tables are not supported. Only first-level regions are reported.

use std::fmt;
use std::str::FromStr;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::components::{label_components, outer_contour_boxes};
use crate::config::DetectionConfig;
use crate::geometry::{Axis, BoundingBox};
use crate::preprocessing::{binarize_fixed, binarize_otsu, bitwise_and, bitwise_or, open_line};

/// Strategy used to locate table regions on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Outer ink contours filtered by size
    #[default]
    ContourArea,
    /// Connected horizontal and vertical strokes that cross
    LineIntersection,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::ContourArea => "contour_area",
            DetectionMode::LineIntersection => "line_intersection",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contour_area" | "contour" => Ok(DetectionMode::ContourArea),
            "line_intersection" | "lines" | "hough" => Ok(DetectionMode::LineIntersection),
            other => Err(format!("unknown detection mode: {}", other)),
        }
    }
}

/// A table region detection strategy.
///
/// Implementations must be deterministic: identical pixels give identical
/// boxes in identical order.
pub trait TableDetector: Send + Sync {
    fn mode(&self) -> DetectionMode;

    /// Candidate table regions of a grayscale page, in page coordinates.
    fn detect(&self, gray: &GrayImage) -> Vec<BoundingBox>;
}

/// Outer contours of the ink whose boxes exceed a minimum size.
#[derive(Debug, Clone)]
pub struct ContourAreaDetector {
    ink_threshold: u8,
    min_width: u32,
    min_height: u32,
}

impl ContourAreaDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            ink_threshold: config.ink_threshold,
            min_width: config.min_table_width,
            min_height: config.min_table_height,
        }
    }
}

impl TableDetector for ContourAreaDetector {
    fn mode(&self) -> DetectionMode {
        DetectionMode::ContourArea
    }

    fn detect(&self, gray: &GrayImage) -> Vec<BoundingBox> {
        let binary = binarize_fixed(gray, self.ink_threshold).image;
        outer_contour_boxes(&binary)
            .into_iter()
            .filter(|bbox| bbox.width() > self.min_width && bbox.height() > self.min_height)
            .collect()
    }
}

/// Connected stroke networks that contain at least one junction.
#[derive(Debug, Clone)]
pub struct LineIntersectionDetector {
    kernel_len: u32,
    iterations: u32,
    min_size: u32,
}

impl LineIntersectionDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            kernel_len: config.stroke_kernel_len,
            iterations: config.stroke_iterations,
            min_size: config.min_skeleton_size,
        }
    }
}

impl TableDetector for LineIntersectionDetector {
    fn mode(&self) -> DetectionMode {
        DetectionMode::LineIntersection
    }

    fn detect(&self, gray: &GrayImage) -> Vec<BoundingBox> {
        let binary = binarize_otsu(gray).image;
        let horizontal = open_line(&binary, Axis::Horizontal, self.kernel_len, self.iterations);
        let vertical = open_line(&binary, Axis::Vertical, self.kernel_len, self.iterations);
        let junctions = bitwise_and(&horizontal, &vertical);
        let strokes = bitwise_or(&horizontal, &vertical);

        let (labels, components) = label_components(&strokes);
        let max_label = components.iter().map(|c| c.label).max().unwrap_or(0) as usize;
        let mut has_junction = vec![false; max_label + 1];
        for (x, y, pixel) in junctions.enumerate_pixels() {
            if pixel[0] > 0 {
                let label = labels.get_pixel(x, y)[0] as usize;
                if let Some(flag) = has_junction.get_mut(label) {
                    *flag = true;
                }
            }
        }

        let candidates: Vec<BoundingBox> = components
            .iter()
            .filter(|c| has_junction[c.label as usize])
            .map(|c| c.bbox)
            .filter(|bbox| bbox.width() > self.min_size && bbox.height() > self.min_size)
            .collect();

        first_level(candidates)
    }
}

/// Drops every box lying inside another box of the set.
fn first_level(boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
    boxes
        .iter()
        .enumerate()
        .filter(|(i, inner)| {
            !boxes
                .iter()
                .enumerate()
                .any(|(j, outer)| *i != j && outer != *inner && outer.contains(inner))
        })
        .map(|(_, bbox)| *bbox)
        .collect()
}

/// Builds the detector for `config.mode`.
pub fn detector_for(config: &DetectionConfig) -> Box<dyn TableDetector> {
    match config.mode {
        DetectionMode::ContourArea => Box::new(ContourAreaDetector::new(config)),
        DetectionMode::LineIntersection => Box::new(LineIntersectionDetector::new(config)),
    }
}

/// Detects the table regions of a grayscale page.
pub fn detect_tables(gray: &GrayImage, config: &DetectionConfig) -> Vec<BoundingBox> {
    let detector = detector_for(config);
    let regions = detector.detect(gray);

    tracing::debug!(
        target: "table_grid",
        mode = %detector.mode(),
        regions = regions.len(),
        "Detected table regions"
    );

    regions
}
