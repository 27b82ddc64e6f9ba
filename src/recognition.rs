//! # Cell Recognition
//!
//! Hands the cells of an extracted table to a text recognizer. Each cell is
//! cropped from the page, converted to gray, padded with white so glyphs do
//! not touch the border, and contrast-enhanced with CLAHE before it reaches
//! the engine. The core never retries or post-processes recognition beyond
//! trimming whitespace.
//!
//! ## Dependencies
//!
//! - `leptess`: Rust bindings for Tesseract OCR and Leptonica
//! - `parking_lot`: serializes access to the single Tesseract instance

use std::io::Cursor;
use std::time::Instant;

use image::{DynamicImage, GrayImage, ImageFormat};
use leptess::LepTess;
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::RecognitionConfig;
use crate::debug::DebugSink;
use crate::errors::{error_logging, ExtractionError, RecognitionError};
use crate::geometry::{BoundingBox, Table};
use crate::observability::{record_cell_recognition_metrics, recognition_span};
use crate::preprocessing::{apply_clahe, crop_region, pad_with_background};

/// Turns a prepared cell image into text.
pub trait CellRecognizer {
    fn recognize(&self, cell: &GrayImage) -> Result<String, RecognitionError>;
}

/// Tesseract-backed recognizer.
pub struct TesseractRecognizer {
    tess: Mutex<LepTess>,
}

impl TesseractRecognizer {
    /// Initializes Tesseract with the configured languages, page segmentation
    /// mode and optional whitelist.
    pub fn new(config: &RecognitionConfig) -> Result<Self, RecognitionError> {
        let mut tess = LepTess::new(config.tessdata_path.as_deref(), &config.languages)
            .map_err(|e| RecognitionError::Initialization(e.to_string()))?;

        tess.set_variable(
            leptess::Variable::TesseditPagesegMode,
            config.psm_mode.as_str(),
        )
        .map_err(|e| RecognitionError::Initialization(format!("Failed to set PSM mode: {}", e)))?;

        if let Some(whitelist) = &config.character_whitelist {
            tess.set_variable(leptess::Variable::TesseditCharWhitelist, whitelist)
                .map_err(|e| {
                    RecognitionError::Initialization(format!(
                        "Failed to set character whitelist: {}",
                        e
                    ))
                })?;
        }

        tracing::info!(
            languages = %config.languages,
            psm = config.psm_mode.as_str(),
            "Tesseract recognizer initialized"
        );

        Ok(Self {
            tess: Mutex::new(tess),
        })
    }
}

impl CellRecognizer for TesseractRecognizer {
    fn recognize(&self, cell: &GrayImage) -> Result<String, RecognitionError> {
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(cell.clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| RecognitionError::ImageLoad(e.to_string()))?;

        let mut tess = self.tess.lock();
        tess.set_image_from_mem(&png)
            .map_err(|e| RecognitionError::ImageLoad(format!("Failed to load cell image: {}", e)))?;
        let text = tess
            .get_utf8_text()
            .map_err(|e| RecognitionError::Extraction(format!("Failed to extract text: {}", e)))?;

        Ok(text.trim().to_string())
    }
}

/// Builds the image a recognizer sees for `cell`.
///
/// Returns `Ok(None)` when the cell has no area inside the page.
pub fn prepare_cell_image(
    page: &DynamicImage,
    cell: &BoundingBox,
    config: &RecognitionConfig,
) -> Result<Option<GrayImage>, RecognitionError> {
    let crop = match crop_region(page, cell) {
        Ok((crop, _)) => crop,
        Err(ExtractionError::DegenerateGeometry { .. }) => return Ok(None),
        Err(e) => return Err(RecognitionError::ImageLoad(e.to_string())),
    };

    let padded = pad_with_background(&crop.to_luma8(), config.cell_padding, 255);
    let enhanced = apply_clahe(&padded, config.clahe_clip_limit, config.clahe_tile_grid)
        .map_err(|e| RecognitionError::ImageLoad(e.to_string()))?;

    Ok(Some(enhanced.image))
}

/// Recognized text of one table, row-major, aligned with its cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedTable {
    pub region: BoundingBox,
    pub rows: Vec<Vec<String>>,
}

impl RecognizedTable {
    /// Same shape as `table` with every cell left blank.
    pub fn blank(table: &Table) -> Self {
        Self {
            region: table.region,
            rows: table
                .rows
                .iter()
                .map(|row| vec![String::new(); row.len()])
                .collect(),
        }
    }
}

/// Recognizes every cell of `table`.
///
/// Cells with no area, or whose recognition fails, come back as empty strings
/// so the matrix keeps the table's shape. An enabled `sink` receives each
/// prepared cell image as `cell_{x1}_{y1}_{x2}_{y2}_contrast`.
pub fn recognize_table(
    page: &DynamicImage,
    table: &Table,
    recognizer: &dyn CellRecognizer,
    config: &RecognitionConfig,
    sink: &dyn DebugSink,
) -> RecognizedTable {
    let _span = recognition_span("recognize_table").entered();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| recognize_cell(page, &cell.bbox, recognizer, config, sink))
                .collect()
        })
        .collect();

    RecognizedTable {
        region: table.region,
        rows,
    }
}

fn recognize_cell(
    page: &DynamicImage,
    bbox: &BoundingBox,
    recognizer: &dyn CellRecognizer,
    config: &RecognitionConfig,
    sink: &dyn DebugSink,
) -> String {
    let start = Instant::now();
    let result = prepare_cell_image(page, bbox, config).and_then(|prepared| match prepared {
        Some(image) => {
            if sink.enabled() {
                let name = format!("cell_{}_{}_{}_{}_contrast", bbox.x1, bbox.y1, bbox.x2, bbox.y2);
                sink.record_mask(&name, &image);
            }
            recognizer.recognize(&image)
        }
        None => {
            tracing::debug!(
                cell = ?(bbox.x1, bbox.y1, bbox.x2, bbox.y2),
                "Skipping cell with no area"
            );
            Ok(String::new())
        }
    });
    let duration = start.elapsed();

    match result {
        Ok(text) => {
            record_cell_recognition_metrics(true, duration);
            text
        }
        Err(e) => {
            record_cell_recognition_metrics(false, duration);
            error_logging::log_recognition_error(&e, "recognize_cell", Some(bbox), Some(duration));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{DirectorySink, NoopSink};
    use crate::geometry::{Cell, Row};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    /// Reports the prepared image size instead of reading text.
    struct SizeRecognizer;

    impl CellRecognizer for SizeRecognizer {
        fn recognize(&self, cell: &GrayImage) -> Result<String, RecognitionError> {
            Ok(format!("{}x{}", cell.width(), cell.height()))
        }
    }

    struct FailingRecognizer;

    impl CellRecognizer for FailingRecognizer {
        fn recognize(&self, _cell: &GrayImage) -> Result<String, RecognitionError> {
            Err(RecognitionError::Extraction("engine crashed".to_string()))
        }
    }

    fn page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([255, 255, 255])))
    }

    fn table() -> Table {
        let cell = |x1, col| Cell {
            bbox: BoundingBox::new(x1, 10, x1 + 20, 30),
            row: 0,
            col,
        };
        Table {
            region: BoundingBox::new(0, 0, 100, 100),
            rows: vec![Row {
                cells: vec![
                    cell(10, 0),
                    Cell {
                        bbox: BoundingBox::new(40, 10, 40, 30),
                        row: 0,
                        col: 1,
                    },
                    cell(60, 2),
                ],
            }],
        }
    }

    #[test]
    fn test_prepare_cell_image_pads() {
        let config = RecognitionConfig::default();
        let prepared = prepare_cell_image(&page(), &BoundingBox::new(10, 10, 30, 20), &config)
            .expect("prepare")
            .expect("cell has area");
        assert_eq!(prepared.dimensions(), (30, 20));
    }

    #[test]
    fn test_prepare_zero_area_cell() {
        let config = RecognitionConfig::default();
        let prepared = prepare_cell_image(&page(), &BoundingBox::new(10, 10, 10, 20), &config)
            .expect("degenerate cells are not errors");
        assert!(prepared.is_none());
    }

    #[test]
    fn test_recognize_table_keeps_shape() {
        let config = RecognitionConfig::default();
        let recognized = recognize_table(&page(), &table(), &SizeRecognizer, &config, &NoopSink);

        assert_eq!(recognized.rows.len(), 1);
        assert_eq!(recognized.rows[0], vec!["30x30", "", "30x30"]);
    }

    #[test]
    fn test_recognition_failure_yields_empty_text() {
        let config = RecognitionConfig::default();
        let recognized = recognize_table(&page(), &table(), &FailingRecognizer, &config, &NoopSink);
        assert!(recognized.rows[0].iter().all(String::is_empty));
    }

    #[test]
    fn test_prepared_cells_saved_to_debug_sink() {
        let dir = TempDir::new().expect("tempdir");
        let sink = DirectorySink::create(dir.path()).expect("sink");
        let config = RecognitionConfig::default();

        recognize_table(&page(), &table(), &SizeRecognizer, &config, &sink);

        let saved = image::open(dir.path().join("cell_10_10_30_30_contrast.png"))
            .expect("contrast image saved");
        assert_eq!(saved.width(), 30);
        assert_eq!(saved.height(), 30);
        assert!(dir.path().join("cell_60_10_80_30_contrast.png").exists());
        // zero-area cells are never prepared
        assert!(!dir.path().join("cell_40_10_40_30_contrast.png").exists());
    }

    #[test]
    fn test_blank_matches_table_shape() {
        let blank = RecognizedTable::blank(&table());
        assert_eq!(blank.rows, vec![vec![String::new(); 3]]);
    }
}
