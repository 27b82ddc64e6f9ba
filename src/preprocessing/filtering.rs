//! # Image Filtering Module
//!
//! Morphology on binary masks and local contrast enhancement.
//!
//! Structuring elements are 1-pixel-thick lines (or separable rectangles)
//! anchored at `len / 2`. Dilation uses the reflected element, so an opening
//! restores a surviving stroke to its exact extent even for even lengths.
//! Samples that fall outside the image are ignored, so strokes touching the
//! border are neither eroded nor grown by the edge.

use image::{GrayImage, Luma};

use super::types::{ClaheImageResult, PreprocessingError};
use crate::geometry::Axis;

/// Opening with a line element: keeps only strokes at least `len` long along `axis`.
///
/// `iterations` repeats each primitive, so two iterations are two erosions
/// followed by two dilations.
pub fn open_line(mask: &GrayImage, axis: Axis, len: u32, iterations: u32) -> GrayImage {
    let iterations = iterations.max(1);
    let eroded = (0..iterations).fold(mask.clone(), |acc, _| erode_line(&acc, axis, len));
    (0..iterations).fold(eroded, |acc, _| dilate_line(&acc, axis, len))
}

/// Dilates with a `size`×`size` square element.
pub fn dilate_rect(mask: &GrayImage, size: u32) -> GrayImage {
    if size <= 1 {
        return mask.clone();
    }
    let grown = dilate_line(mask, Axis::Horizontal, size);
    dilate_line(&grown, Axis::Vertical, size)
}

/// Pixel-wise AND of two same-sized masks.
pub fn bitwise_and(a: &GrayImage, b: &GrayImage) -> GrayImage {
    combine(a, b, |p, q| p > 0 && q > 0)
}

/// Pixel-wise OR of two same-sized masks.
pub fn bitwise_or(a: &GrayImage, b: &GrayImage) -> GrayImage {
    combine(a, b, |p, q| p > 0 || q > 0)
}

fn combine(a: &GrayImage, b: &GrayImage, keep: impl Fn(u8, u8) -> bool) -> GrayImage {
    let width = a.width().min(b.width());
    let height = a.height().min(b.height());
    GrayImage::from_fn(width, height, |x, y| {
        if keep(a.get_pixel(x, y)[0], b.get_pixel(x, y)[0]) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

fn erode_line(mask: &GrayImage, axis: Axis, len: u32) -> GrayImage {
    let len = len.max(1) as usize;
    sweep_line(mask, axis, len, len / 2, |ink, total| ink == total)
}

fn dilate_line(mask: &GrayImage, axis: Axis, len: u32) -> GrayImage {
    let len = len.max(1) as usize;
    sweep_line(mask, axis, len, len - 1 - len / 2, |ink, _| ink > 0)
}

/// Slides the window `[i - anchor, i - anchor + len)` along every row (or
/// column) and writes 255 where `keep(ink_in_window, samples_in_window)` holds.
/// Prefix sums keep it linear.
fn sweep_line(
    mask: &GrayImage,
    axis: Axis,
    len: usize,
    anchor: usize,
    keep: impl Fn(u32, u32) -> bool,
) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    let (lines, span) = match axis {
        Axis::Horizontal => (height, width),
        Axis::Vertical => (width, height),
    };
    let span = span as usize;
    let at = |line: u32, i: usize| match axis {
        Axis::Horizontal => (i as u32, line),
        Axis::Vertical => (line, i as u32),
    };

    let mut prefix = vec![0u32; span + 1];
    for line in 0..lines {
        for i in 0..span {
            let (x, y) = at(line, i);
            prefix[i + 1] = prefix[i] + u32::from(mask.get_pixel(x, y)[0] > 0);
        }
        for i in 0..span {
            let lo = i.saturating_sub(anchor);
            let hi = (i + len - anchor).min(span);
            let ink = prefix[hi] - prefix[lo];
            if keep(ink, (hi - lo) as u32) {
                let (x, y) = at(line, i);
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }

    out
}

/// Applies Contrast Limited Adaptive Histogram Equalization (CLAHE).
///
/// The image is split into a `tile_grid.0` × `tile_grid.1` grid; each tile is
/// equalized independently with its histogram clipped at
/// `clip_limit × (tile pixels / 256)` and the excess redistributed uniformly.
pub fn apply_clahe(
    image: &GrayImage,
    clip_limit: f32,
    tile_grid: (u32, u32),
) -> Result<ClaheImageResult, PreprocessingError> {
    if clip_limit <= 0.0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!("clip limit must be > 0.0, got {}", clip_limit),
        });
    }
    if tile_grid.0 == 0 || tile_grid.1 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: "tile grid dimensions must be > 0".to_string(),
        });
    }

    let (width, height) = image.dimensions();
    let mut output = image.clone();
    if width == 0 || height == 0 {
        return Ok(ClaheImageResult {
            image: output,
            clip_limit,
            tile_size: (0, 0),
        });
    }

    let tile_width = width.div_ceil(tile_grid.0).max(1);
    let tile_height = height.div_ceil(tile_grid.1).max(1);

    for tile_y in (0..height).step_by(tile_height as usize) {
        for tile_x in (0..width).step_by(tile_width as usize) {
            let end_x = (tile_x + tile_width).min(width);
            let end_y = (tile_y + tile_height).min(height);
            equalize_tile(image, &mut output, (tile_x, tile_y, end_x, end_y), clip_limit);
        }
    }

    Ok(ClaheImageResult {
        image: output,
        clip_limit,
        tile_size: (tile_width, tile_height),
    })
}

fn equalize_tile(
    source: &GrayImage,
    output: &mut GrayImage,
    (x0, y0, x1, y1): (u32, u32, u32, u32),
    clip_limit: f32,
) {
    let total_pixels = ((x1 - x0) * (y1 - y0)) as f32;

    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[source.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let clip = ((clip_limit * total_pixels / 256.0).round() as u32).max(1);
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }
    let increment = excess / 256;
    let mut remainder = excess % 256;
    for count in histogram.iter_mut() {
        *count += increment;
        if remainder > 0 {
            *count += 1;
            remainder -= 1;
        }
    }

    let mut cdf = [0f32; 256];
    let mut cumulative = 0f32;
    for (level, &count) in histogram.iter().enumerate() {
        cumulative += count as f32 / total_pixels;
        cdf[level] = cumulative;
    }

    for y in y0..y1 {
        for x in x0..x1 {
            let level = source.get_pixel(x, y)[0] as usize;
            let mapped = (cdf[level] * 255.0).round().clamp(0.0, 255.0) as u8;
            output.put_pixel(x, y, Luma([mapped]));
        }
    }
}
