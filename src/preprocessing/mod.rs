//! # Image Preprocessing Module
//!
//! Pixel-level building blocks for grid extraction and cell recognition.
//!
//! The module is organized into focused sub-modules:
//! - `thresholding`: inverse binarization (Otsu or fixed level) so ink is foreground
//! - `filtering`: directional morphology, mask combination and CLAHE
//! - `cropping`: bounds-checked region crops and cell padding
//! - `types`: shared result and error types

pub mod cropping;
pub mod filtering;
pub mod thresholding;
pub mod types;

pub use types::{ClaheImageResult, PreprocessingError, ThresholdedImageResult};

pub use cropping::{crop_region, pad_with_background};
pub use filtering::{apply_clahe, bitwise_and, bitwise_or, dilate_rect, open_line};
pub use thresholding::{binarize_fixed, binarize_otsu};
