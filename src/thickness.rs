//! # Line Thickness Estimation
//!
//! Measures how thick the extracted rules are. Hairline rules (2px or less)
//! break up under the default opening, so the pipeline strengthens the binary
//! mask once and extracts again when the estimate says they are thin.

use image::GrayImage;
use serde::Serialize;

use crate::components::label_components;
use crate::config::LineConfig;
use crate::geometry::Axis;

/// Median stroke thickness of the components in a line mask.
///
/// Thickness is the component's bounding height for horizontal lines and its
/// bounding width for vertical ones. `None` when the mask has no ink.
pub fn estimate_thickness(mask: &GrayImage, axis: Axis) -> Option<u32> {
    let mut thicknesses: Vec<u32> = label_components(mask)
        .1
        .iter()
        .map(|component| match axis {
            Axis::Horizontal => component.bbox.height(),
            Axis::Vertical => component.bbox.width(),
        })
        .collect();
    median(&mut thicknesses)
}

/// Median of `values`; the two middle values are averaged (rounding down)
/// when the count is even.
pub fn median(values: &mut [u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2)
    }
}

/// Thickness measurements for both axes of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThicknessEstimate {
    pub horizontal: Option<u32>,
    pub vertical: Option<u32>,
}

impl ThicknessEstimate {
    pub fn measure(horizontal: &GrayImage, vertical: &GrayImage) -> Self {
        Self {
            horizontal: estimate_thickness(horizontal, Axis::Horizontal),
            vertical: estimate_thickness(vertical, Axis::Vertical),
        }
    }

    /// Thinner of the two axes, or the configured fallback when either axis
    /// has no lines.
    pub fn effective(&self, config: &LineConfig) -> u32 {
        match (self.horizontal, self.vertical) {
            (Some(h), Some(v)) => h.min(v),
            _ => config.fallback_thickness,
        }
    }

    pub fn is_thin(&self, config: &LineConfig) -> bool {
        self.effective(config) <= config.thin_line_threshold
    }
}

/// Dilation size the binary mask gets before the second extraction pass.
/// `None` means the first pass is final.
pub fn refinement_kernel(estimate: &ThicknessEstimate, config: &LineConfig) -> Option<u32> {
    if estimate.is_thin(config) {
        Some(config.refine_kernel_size)
    } else {
        None
    }
}
