//! # Document Processing
//!
//! Runs grid extraction over an ordered list of page images and collects the
//! results into a [`DocumentReport`]. Pages are extracted in parallel; cell
//! recognition, when enabled, runs afterwards in page order because the
//! recognizer owns a single engine instance.
//!
//! A page without tables still gets an entry, and an unreadable page is
//! reported in place without stopping the rest of the batch.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::DynamicImage;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{GridConfig, RecognitionConfig};
use crate::debug::DebugSink;
use crate::errors::ExtractionError;
use crate::geometry::{BoundingBox, Table};
use crate::pipeline::{GridExtractor, PageExtraction, RegionFailure};
use crate::recognition::{recognize_table, CellRecognizer, RecognizedTable};

/// Marker rendered for pages without tables.
pub const NO_TABLES_MARKER: &str = "No tables detected.";

/// Decodes a page image file.
pub fn load_page(path: impl AsRef<Path>) -> Result<DynamicImage, ExtractionError> {
    let path = path.as_ref();
    image::open(path)
        .map_err(|e| ExtractionError::Upstream(format!("{}: {}", path.display(), e)))
}

/// One table of a page report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub region: BoundingBox,
    /// Cell boxes, row-major
    pub cells: Vec<Vec<BoundingBox>>,
    /// Recognized text aligned with `cells`, absent in geometry-only runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<Vec<String>>>,
}

impl TableReport {
    fn from_table(table: &Table, recognized: Option<RecognizedTable>) -> Self {
        Self {
            region: table.region,
            cells: table
                .rows
                .iter()
                .map(|row| row.cells.iter().map(|cell| cell.bbox).collect())
                .collect(),
            text: recognized.map(|r| r.rows),
        }
    }
}

/// Everything reported for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    /// 1-based position in the document
    pub page_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub tables: Vec<TableReport>,
    pub failed_regions: Vec<RegionFailure>,
    /// Set when the page could not be read at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageReport {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Ordered page reports of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentReport {
    pub pages: Vec<PageReport>,
}

impl DocumentReport {
    pub fn table_count(&self) -> usize {
        self.pages.iter().map(|page| page.tables.len()).sum()
    }

    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|page| page.is_failed()).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Paginated plain text: a `Page N` heading per page, one tab-separated
    /// line per table row, and a marker for pages without tables.
    ///
    /// Cells print their text when recognition ran, their box otherwise.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "Page {}", page.page_number);

            if let Some(error) = &page.error {
                let _ = writeln!(out, "Error: {}", error);
                continue;
            }
            if page.tables.is_empty() {
                let _ = writeln!(out, "{}", NO_TABLES_MARKER);
                continue;
            }
            for (t, table) in page.tables.iter().enumerate() {
                let _ = writeln!(out, "Table {}", t + 1);
                match &table.text {
                    Some(rows) => {
                        for row in rows {
                            let _ = writeln!(out, "{}", row.join("\t"));
                        }
                    }
                    None => {
                        for row in &table.cells {
                            let line: Vec<String> = row
                                .iter()
                                .map(|b| format!("({},{},{},{})", b.x1, b.y1, b.x2, b.y2))
                                .collect();
                            let _ = writeln!(out, "{}", line.join("\t"));
                        }
                    }
                }
            }
        }
        out
    }
}

/// A page waiting to be processed.
#[derive(Debug, Clone)]
pub enum PageSource {
    /// An image file on disk
    File(PathBuf),
    /// An already decoded page buffer
    Image(DynamicImage),
}

impl PageSource {
    fn label(&self) -> Option<String> {
        match self {
            PageSource::File(path) => Some(path.display().to_string()),
            PageSource::Image(_) => None,
        }
    }

    fn load(&self) -> Result<DynamicImage, ExtractionError> {
        match self {
            PageSource::File(path) => load_page(path),
            PageSource::Image(image) => Ok(image.clone()),
        }
    }
}

/// Batch processor for the pages of one document.
pub struct DocumentProcessor<'a> {
    grid: &'a GridConfig,
    recognition: &'a RecognitionConfig,
    sink: &'a dyn DebugSink,
    recognizer: Option<&'a dyn CellRecognizer>,
}

impl<'a> DocumentProcessor<'a> {
    pub fn new(
        grid: &'a GridConfig,
        recognition: &'a RecognitionConfig,
        sink: &'a dyn DebugSink,
    ) -> Self {
        Self {
            grid,
            recognition,
            sink,
            recognizer: None,
        }
    }

    /// Recognizes the text of every cell with `recognizer`.
    pub fn with_recognizer(mut self, recognizer: &'a dyn CellRecognizer) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Processes pages in order. Page numbers follow `pages`, starting at 1.
    pub fn process(&self, pages: &[PageSource]) -> DocumentReport {
        let start = Instant::now();
        let extractor = GridExtractor::new(self.grid, self.sink);

        let extracted: Vec<(Option<DynamicImage>, Result<PageExtraction, ExtractionError>)> = pages
            .par_iter()
            .enumerate()
            .map(|(index, source)| match source.load() {
                Ok(image) => {
                    let result = extractor.extract_page(&image, index);
                    (Some(image), result)
                }
                Err(e) => (None, Err(e)),
            })
            .collect();

        let reports: Vec<PageReport> = extracted
            .into_iter()
            .zip(pages)
            .enumerate()
            .map(|(index, ((image, result), source))| {
                self.page_report(index + 1, source.label(), image.as_ref(), result)
            })
            .collect();

        let report = DocumentReport { pages: reports };

        tracing::info!(
            pages = report.pages.len(),
            tables = report.table_count(),
            failed_pages = report.failed_pages(),
            duration_ms = start.elapsed().as_millis(),
            "Document processing completed"
        );

        report
    }

    /// Convenience for a list of image files.
    pub fn process_files(&self, paths: &[PathBuf]) -> DocumentReport {
        let sources: Vec<PageSource> = paths.iter().cloned().map(PageSource::File).collect();
        self.process(&sources)
    }

    fn page_report(
        &self,
        page_number: usize,
        source: Option<String>,
        image: Option<&DynamicImage>,
        result: Result<PageExtraction, ExtractionError>,
    ) -> PageReport {
        let extraction = match result {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::error!(page_number, error = %e, "Page could not be processed");
                return PageReport {
                    page_number,
                    source,
                    tables: Vec::new(),
                    failed_regions: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let tables = extraction
            .tables
            .iter()
            .map(|table| {
                let recognized = match (self.recognizer, image) {
                    (Some(recognizer), Some(image)) => {
                        Some(recognize_table(
                            image,
                            table,
                            recognizer,
                            self.recognition,
                            self.sink,
                        ))
                    }
                    _ => None,
                };
                TableReport::from_table(table, recognized)
            })
            .collect();

        PageReport {
            page_number,
            source,
            tables,
            failed_regions: extraction.failures,
            error: None,
        }
    }
}
