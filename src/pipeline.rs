//! # Grid Extraction Pipeline
//!
//! Runs the stages in order for one page:
//!
//! 1. table region detection on the whole page
//! 2. per region: crop, inverse Otsu binarization
//! 3. the line stage: extract both axes, measure thickness, and when the rules
//!    are thin dilate the binary mask and extract once more
//! 4. clustering of both masks into grid axes
//! 5. cell and row assembly
//!
//! Regions are independent. A region that fails is reported next to the
//! tables that succeeded; only an unreadable page fails the whole call.

use std::time::Instant;

use image::{DynamicImage, GrayImage};
use serde::Serialize;

use crate::assembly::assemble_table;
use crate::clustering::grid_positions;
use crate::config::{GridConfig, LineConfig};
use crate::debug::{draw_overlay, DebugSink, NoopSink};
use crate::detection::detect_tables;
use crate::errors::{error_logging, ExtractionError};
use crate::geometry::{Axis, BoundingBox, Table};
use crate::lines::{extract_line_masks, LineMasks};
use crate::observability::{page_span, record_page_metrics, record_region_failure, region_span, PageMetricsParams};
use crate::preprocessing::{binarize_otsu, crop_region, dilate_rect};
use crate::thickness::{refinement_kernel, ThicknessEstimate};

/// Result of the two-pass line stage for one region.
#[derive(Debug, Clone)]
pub struct LineStage {
    /// Masks the grid is built from: first pass, or the refined pass when the
    /// rules were thin.
    pub masks: LineMasks,
    /// Thickness measured on the first pass.
    pub estimate: ThicknessEstimate,
    /// Size of the square dilation applied before the second pass, if any.
    pub refined_with: Option<u32>,
}

/// Extracts lines, measures them, and re-extracts at most once.
pub fn run_line_stage(binary: &GrayImage, config: &LineConfig) -> LineStage {
    let first = extract_line_masks(binary, config);
    let estimate = ThicknessEstimate::measure(&first.horizontal, &first.vertical);
    let refined_with = refinement_kernel(&estimate, config);

    tracing::debug!(
        target: "table_grid",
        horizontal_thickness = ?estimate.horizontal,
        vertical_thickness = ?estimate.vertical,
        effective = estimate.effective(config),
        refine = refined_with.is_some(),
        "Measured line thickness"
    );

    let masks = match refined_with {
        Some(kernel) => extract_line_masks(&dilate_rect(binary, kernel), config),
        None => first,
    };

    LineStage {
        masks,
        estimate,
        refined_with,
    }
}

/// A region that could not be turned into a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionFailure {
    pub region: BoundingBox,
    pub error: String,
}

/// Everything extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageExtraction {
    /// Tables in detection order, including ones with no rows
    pub tables: Vec<Table>,
    /// Regions that were skipped
    pub failures: Vec<RegionFailure>,
}

impl PageExtraction {
    pub fn cell_count(&self) -> usize {
        self.tables.iter().map(Table::cell_count).sum()
    }
}

/// Grid extraction bound to a configuration and a debug sink.
pub struct GridExtractor<'a> {
    config: &'a GridConfig,
    sink: &'a dyn DebugSink,
}

impl<'a> GridExtractor<'a> {
    pub fn new(config: &'a GridConfig, sink: &'a dyn DebugSink) -> Self {
        Self { config, sink }
    }

    /// Reconstructs the grid of one region of `page`.
    ///
    /// `label` prefixes debug artifact names. A region that has no area inside
    /// the page is a [`ExtractionError::DegenerateGeometry`]; a region without
    /// grid lines is an empty table.
    pub fn extract_region(
        &self,
        page: &DynamicImage,
        region: BoundingBox,
        label: &str,
    ) -> Result<Table, ExtractionError> {
        let _span = region_span(&region).entered();

        let (crop, region) = crop_region(page, &region)?;
        let binary = binarize_otsu(&crop.to_luma8()).image;
        self.artifact(label, "binary", &binary);

        let stage = run_line_stage(&binary, &self.config.lines);
        if let Some(kernel) = stage.refined_with {
            self.artifact(label, "refined_binary", &dilate_rect(&binary, kernel));
        }
        for axis in [Axis::Horizontal, Axis::Vertical] {
            self.artifact(label, &format!("{}_lines", axis.as_str()), stage.masks.get(axis));
        }

        let y_axis = grid_positions(&stage.masks.horizontal, Axis::Horizontal, self.config.y_tolerance);
        let x_axis = grid_positions(&stage.masks.vertical, Axis::Vertical, self.config.x_tolerance);
        let table = assemble_table(region, &x_axis, &y_axis, self.config.row_tolerance);

        tracing::debug!(
            target: "table_grid",
            x_lines = x_axis.len(),
            y_lines = y_axis.len(),
            rows = table.rows.len(),
            cells = table.cell_count(),
            "Assembled table"
        );

        Ok(table)
    }

    /// Detects and extracts every table on a page.
    ///
    /// Fails only when the page buffer itself is unusable.
    pub fn extract_page(
        &self,
        page: &DynamicImage,
        page_index: usize,
    ) -> Result<PageExtraction, ExtractionError> {
        let span = page_span(page_index);
        let _guard = span.enter();
        let start = Instant::now();

        check_page(page)?;

        let gray = page.to_luma8();
        let regions = detect_tables(&gray, &self.config.detection);
        let extraction = self.extract_regions(page, page_index, regions);

        let duration = start.elapsed();
        record_page_metrics(PageMetricsParams {
            duration,
            tables: extraction.tables.len(),
            cells: extraction.cell_count(),
            failed_regions: extraction.failures.len(),
        });

        tracing::info!(
            target: "table_grid",
            page_index,
            tables = extraction.tables.len(),
            cells = extraction.cell_count(),
            failed_regions = extraction.failures.len(),
            duration_ms = duration.as_millis(),
            "Page extraction completed"
        );

        Ok(extraction)
    }

    /// Extracts each of `regions` independently.
    ///
    /// A region that cannot be extracted is recorded as a failure and the
    /// remaining regions still run.
    pub fn extract_regions(
        &self,
        page: &DynamicImage,
        page_index: usize,
        regions: Vec<BoundingBox>,
    ) -> PageExtraction {
        let mut extraction = PageExtraction::default();
        for (table_index, region) in regions.into_iter().enumerate() {
            let label = format!("page{}_table{}", page_index + 1, table_index + 1);
            match self.extract_region(page, region, &label) {
                Ok(table) => extraction.tables.push(table),
                Err(e) => {
                    error_logging::log_region_failure(&e, Some(page_index), &region);
                    record_region_failure(failure_kind(&e));
                    extraction.failures.push(RegionFailure {
                        region,
                        error: e.to_string(),
                    });
                }
            }
        }

        if self.sink.enabled() {
            let overlay = draw_overlay(page, &extraction.tables);
            self.sink
                .record_overlay(&format!("page{}_overlay", page_index + 1), &overlay);
        }

        extraction
    }

    fn artifact(&self, label: &str, stage: &str, mask: &GrayImage) {
        if self.sink.enabled() {
            self.sink.record_mask(&format!("{}_{}", label, stage), mask);
        }
    }
}

/// Extracts the tables of a page with no debug output.
pub fn extract_tables(page: &DynamicImage, config: &GridConfig) -> Result<Vec<Table>, ExtractionError> {
    GridExtractor::new(config, &NoopSink)
        .extract_page(page, 0)
        .map(|extraction| extraction.tables)
}

fn check_page(page: &DynamicImage) -> Result<(), ExtractionError> {
    if page.width() == 0 || page.height() == 0 {
        return Err(ExtractionError::Upstream(format!(
            "page buffer has no pixels ({}x{})",
            page.width(),
            page.height()
        )));
    }
    Ok(())
}

fn failure_kind(error: &ExtractionError) -> &'static str {
    match error {
        ExtractionError::Upstream(_) => "upstream",
        ExtractionError::DegenerateGeometry { .. } => "degenerate_geometry",
    }
}
