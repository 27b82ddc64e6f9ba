//! # Image Thresholding Module
//!
//! Inverse binarization for scanned pages: dark ink becomes foreground (255)
//! and paper becomes background (0). The automatic level uses Otsu's method.

use image::{GrayImage, Luma};

use super::types::ThresholdedImageResult;

/// Binarizes a gray image with an automatically chosen Otsu level, inverted.
///
/// Pixels at or below the level become 255 (ink) and all others 0. The level is
/// the first value in `1..255` that maximizes the between-class variance, so
/// identical pixels always produce an identical mask.
pub fn binarize_otsu(gray: &GrayImage) -> ThresholdedImageResult {
    let mut histogram = [0u32; 256];
    for pixel in gray.pixels() {
        histogram[pixel[0] as usize] += 1;
    }
    let total_pixels = gray.width() as f64 * gray.height() as f64;
    let threshold = find_otsu_threshold(&histogram, total_pixels);

    tracing::debug!(
        target: "table_grid",
        threshold,
        width = gray.width(),
        height = gray.height(),
        "Otsu binarization"
    );

    binarize_fixed(gray, threshold)
}

/// Binarizes a gray image at a fixed level, inverted.
pub fn binarize_fixed(gray: &GrayImage, threshold: u8) -> ThresholdedImageResult {
    let mut binary = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel[0] <= threshold {
            binary.put_pixel(x, y, Luma([255]));
        }
    }

    ThresholdedImageResult {
        image: binary,
        threshold,
    }
}

/// Finds the optimal threshold using Otsu's method by maximizing between-class variance.
///
/// Class 0 holds levels `<= t`, class 1 levels `> t`. Returns 128 for an empty
/// histogram and the first maximizing level otherwise.
fn find_otsu_threshold(histogram: &[u32; 256], total_pixels: f64) -> u8 {
    if total_pixels <= 0.0 {
        return 128;
    }

    let mut cumulative_sums = [0f64; 256];
    let mut cumulative_weighted_sums = [0f64; 256];
    let mut running = 0f64;
    let mut running_weighted = 0f64;
    for (level, &count) in histogram.iter().enumerate() {
        running += count as f64;
        running_weighted += level as f64 * count as f64;
        cumulative_sums[level] = running;
        cumulative_weighted_sums[level] = running_weighted;
    }
    let total_weighted_sum = cumulative_weighted_sums[255];

    let mut max_variance = 0f64;
    let mut optimal_threshold = 128u8;

    for threshold in 1..255usize {
        let below = cumulative_sums[threshold];
        let above = total_pixels - below;
        if below == 0.0 || above == 0.0 {
            continue;
        }

        let w0 = below / total_pixels;
        let w1 = above / total_pixels;
        let mu0 = cumulative_weighted_sums[threshold] / below;
        let mu1 = (total_weighted_sum - cumulative_weighted_sums[threshold]) / above;

        let variance = w0 * w1 * (mu0 - mu1).powi(2);
        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold as u8;
        }
    }

    optimal_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([25]) } else { Luma([225]) })
    }

    #[test]
    fn test_binarize_otsu_marks_dark_pixels_as_ink() {
        let result = binarize_otsu(&two_tone_image());

        assert!((25..225).contains(&result.threshold));
        for (x, _, pixel) in result.image.enumerate_pixels() {
            let expected = if x < 5 { 255 } else { 0 };
            assert_eq!(pixel[0], expected);
        }
    }

    #[test]
    fn test_binarize_otsu_is_deterministic() {
        let img = two_tone_image();
        let first = binarize_otsu(&img);
        let second = binarize_otsu(&img);
        assert_eq!(first.threshold, second.threshold);
        assert_eq!(first.image.as_raw(), second.image.as_raw());
    }

    #[test]
    fn test_binarize_fixed_inverse() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[0, 180, 181][x as usize]]));
        let result = binarize_fixed(&img, 180);
        assert_eq!(result.image.as_raw(), &vec![255, 255, 0]);
    }

    #[test]
    fn test_find_otsu_threshold_two_classes() {
        let mut histogram = [0u32; 256];
        histogram[25] = 5000;
        histogram[225] = 5000;

        let threshold = find_otsu_threshold(&histogram, 10000.0);
        assert!((25..225).contains(&threshold));
    }

    #[test]
    fn test_find_otsu_threshold_black_and_white_picks_first_level() {
        let mut histogram = [0u32; 256];
        histogram[0] = 100;
        histogram[255] = 900;

        assert_eq!(find_otsu_threshold(&histogram, 1000.0), 1);
    }

    #[test]
    fn test_find_otsu_threshold_empty_histogram() {
        let histogram = [0u32; 256];
        assert_eq!(find_otsu_threshold(&histogram, 0.0), 128);
    }
}
