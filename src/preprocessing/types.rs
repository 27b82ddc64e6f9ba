//! # Shared Types for Image Preprocessing
//!
//! Result and error types used across the preprocessing sub-modules.

use image::GrayImage;

/// Errors that can occur during image preprocessing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// A parameter is outside its valid range
    InvalidParameter { message: String },
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::InvalidParameter { message } => {
                write!(f, "Invalid preprocessing parameter: {}", message)
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Result of an inverse thresholding operation.
#[derive(Debug, Clone)]
pub struct ThresholdedImageResult {
    /// Binary mask: ink is 255, background is 0
    pub image: GrayImage,
    /// Gray level at or below which a pixel was classified as ink
    pub threshold: u8,
}

/// Result of CLAHE contrast enhancement operation.
#[derive(Debug, Clone)]
pub struct ClaheImageResult {
    /// The contrast-enhanced image
    pub image: GrayImage,
    /// Clip limit used for histogram clipping
    pub clip_limit: f32,
    /// Tile size in pixels used for local histogram equalization
    pub tile_size: (u32, u32),
}
