//! # Directional Line Extraction
//!
//! Isolates ruling lines along one axis of a binary region mask. An opening
//! with a 1-pixel-thick element sized relative to the region keeps only long
//! straight strokes, then components too short to be trusted are dropped.
//! Vertical rules need a longer minimum run: thin vertical separators are
//! easily confused with the stems of characters.

use image::GrayImage;

use crate::components::retain_components;
use crate::config::LineConfig;
use crate::geometry::Axis;
use crate::preprocessing::open_line;

/// Horizontal and vertical ruling-line masks of one region.
#[derive(Debug, Clone)]
pub struct LineMasks {
    pub horizontal: GrayImage,
    pub vertical: GrayImage,
}

impl LineMasks {
    pub fn get(&self, axis: Axis) -> &GrayImage {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }
}

/// Structuring element length for a region dimension.
pub fn kernel_length(dimension: u32, config: &LineConfig) -> u32 {
    (dimension / config.kernel_divisor.max(1)).max(config.min_kernel_len)
}

/// Minimum component extent along `axis` for a line to be kept.
pub fn min_line_length(axis: Axis, config: &LineConfig) -> u32 {
    match axis {
        Axis::Horizontal => config.min_horizontal_len,
        Axis::Vertical => config.min_vertical_len,
    }
}

/// Extracts the ruling lines of `binary` running along `axis`.
///
/// The element spans the region width for horizontal lines and the region
/// height for vertical ones. The output has the same size as the input.
pub fn extract_lines(binary: &GrayImage, axis: Axis, config: &LineConfig) -> GrayImage {
    let dimension = match axis {
        Axis::Horizontal => binary.width(),
        Axis::Vertical => binary.height(),
    };
    let len = kernel_length(dimension, config);
    let opened = open_line(binary, axis, len, 1);
    let filtered = filter_short_lines(&opened, axis, min_line_length(axis, config));

    tracing::debug!(
        target: "table_grid",
        axis = axis.as_str(),
        kernel_len = len,
        "Extracted ruling lines"
    );

    filtered
}

/// Extracts both axes.
pub fn extract_line_masks(binary: &GrayImage, config: &LineConfig) -> LineMasks {
    LineMasks {
        horizontal: extract_lines(binary, Axis::Horizontal, config),
        vertical: extract_lines(binary, Axis::Vertical, config),
    }
}

/// Drops every component whose extent along `axis` is below `min_len`.
pub fn filter_short_lines(mask: &GrayImage, axis: Axis, min_len: u32) -> GrayImage {
    retain_components(mask, |component| {
        let extent = match axis {
            Axis::Horizontal => component.bbox.width(),
            Axis::Vertical => component.bbox.height(),
        };
        extent >= min_len
    })
}
