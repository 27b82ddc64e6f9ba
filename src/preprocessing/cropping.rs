//! # Image Cropping Module
//!
//! Bounds-checked crops of table regions and cells, and the white border added
//! around a cell before it is handed to a recognizer.

use image::{DynamicImage, GenericImage, GrayImage, Luma};

use crate::errors::ExtractionError;
use crate::geometry::BoundingBox;

/// Crops `bbox` out of `page`, clamped to the page bounds.
///
/// Returns the crop together with the clamped box actually used. A box that
/// has no area once clamped is a [`ExtractionError::DegenerateGeometry`].
pub fn crop_region(
    page: &DynamicImage,
    bbox: &BoundingBox,
) -> Result<(DynamicImage, BoundingBox), ExtractionError> {
    let safe = bbox.clamp_to(page.width(), page.height());
    if safe.is_degenerate() {
        return Err(ExtractionError::DegenerateGeometry { bbox: *bbox });
    }

    let cropped = page.crop_imm(safe.x1, safe.y1, safe.width(), safe.height());

    tracing::trace!(
        target: "table_grid",
        requested = ?(bbox.x1, bbox.y1, bbox.x2, bbox.y2),
        clamped = ?(safe.x1, safe.y1, safe.x2, safe.y2),
        "Cropped region"
    );

    Ok((cropped, safe))
}

/// Surrounds a gray image with a constant `value` border of `padding` pixels.
pub fn pad_with_background(image: &GrayImage, padding: u32, value: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut padded = GrayImage::from_pixel(width + 2 * padding, height + 2 * padding, Luma([value]));
    // The canvas is larger than the source on both axes, so the copy always fits.
    if padded.copy_from(image, padding, padding).is_err() {
        return image.clone();
    }
    padded
}
