//! # Debug Artifacts
//!
//! Optional inspection images for every intermediate stage of grid
//! extraction. Sinks only observe: nothing they do, including failing to
//! write a file, changes the geometry that extraction returns.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::errors::error_logging;
use crate::geometry::{BoundingBox, Table};

const TABLE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CELL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TABLE_STROKE: u32 = 3;

/// Receiver for intermediate stage images.
pub trait DebugSink: Send + Sync {
    /// Whether stage images should be produced at all. Callers skip building
    /// artifacts when this is false.
    fn enabled(&self) -> bool;

    fn record_mask(&self, name: &str, mask: &GrayImage);

    fn record_overlay(&self, name: &str, overlay: &RgbImage);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn record_mask(&self, _name: &str, _mask: &GrayImage) {}

    fn record_overlay(&self, _name: &str, _overlay: &RgbImage) {}
}

/// Writes each artifact as `<dir>/<name>.png`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates the directory if needed.
    pub fn create(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", name))
    }

    fn save(&self, name: &str, result: image::ImageResult<()>) {
        let path = self.path_for(name);
        match result {
            Ok(()) => tracing::trace!(
                target: "table_grid",
                path = %path.display(),
                "Saved debug artifact"
            ),
            Err(e) => error_logging::log_filesystem_error(
                &e,
                "save_debug_artifact",
                path.to_str(),
            ),
        }
    }
}

impl DebugSink for DirectorySink {
    fn enabled(&self) -> bool {
        true
    }

    fn record_mask(&self, name: &str, mask: &GrayImage) {
        self.save(name, mask.save(self.path_for(name)));
    }

    fn record_overlay(&self, name: &str, overlay: &RgbImage) {
        self.save(name, overlay.save(self.path_for(name)));
    }
}

/// Draws table regions (blue, 3 px) and their cells (green, 1 px) on a copy
/// of the page.
pub fn draw_overlay(page: &DynamicImage, tables: &[Table]) -> RgbImage {
    let mut canvas = page.to_rgb8();
    for table in tables {
        for cell in table.cells() {
            draw_box(&mut canvas, &cell.bbox, CELL_COLOR);
        }
        for inset in 0..TABLE_STROKE {
            let region = &table.region;
            if region.width() <= 2 * inset || region.height() <= 2 * inset {
                break;
            }
            let shrunk = BoundingBox::new(
                region.x1 + inset,
                region.y1 + inset,
                region.x2 - inset,
                region.y2 - inset,
            );
            draw_box(&mut canvas, &shrunk, TABLE_COLOR);
        }
    }
    canvas
}

fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    if bbox.is_degenerate() {
        return;
    }
    let rect = Rect::at(bbox.x1 as i32, bbox.y1 as i32).of_size(bbox.width(), bbox.height());
    draw_hollow_rect_mut(canvas, rect, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Cell, Row};
    use tempfile::TempDir;

    fn sample_table() -> Table {
        let region = BoundingBox::new(10, 10, 60, 40);
        Table {
            region,
            rows: vec![Row {
                cells: vec![Cell {
                    bbox: BoundingBox::new(20, 20, 30, 30),
                    row: 0,
                    col: 0,
                }],
            }],
        }
    }

    #[test]
    fn test_overlay_colors() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 60, Rgb([255, 255, 255])));
        let overlay = draw_overlay(&page, &[sample_table()]);

        assert_eq!(*overlay.get_pixel(10, 25), TABLE_COLOR);
        assert_eq!(*overlay.get_pixel(12, 25), TABLE_COLOR);
        assert_eq!(*overlay.get_pixel(13, 25), Rgb([255, 255, 255]));
        assert_eq!(*overlay.get_pixel(20, 25), CELL_COLOR);
        assert_eq!(*overlay.get_pixel(25, 25), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_directory_sink_writes_png() {
        let dir = TempDir::new().expect("temp dir");
        let sink = DirectorySink::create(dir.path().join("debug")).expect("create sink");
        sink.record_mask("page1_table1_binary", &GrayImage::new(4, 4));

        let written = sink.dir().join("page1_table1_binary.png");
        assert!(written.exists());
        assert!(sink.enabled());
        assert!(!NoopSink.enabled());
    }
}
