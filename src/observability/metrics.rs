//! Metrics recording functions for page extraction and cell recognition.

/// Parameters for page extraction metrics recording
#[derive(Debug, Clone)]
pub struct PageMetricsParams {
    pub duration: std::time::Duration,
    pub tables: usize,
    pub cells: usize,
    pub failed_regions: usize,
}

/// Record metrics for one processed page
pub fn record_page_metrics(params: PageMetricsParams) {
    let PageMetricsParams {
        duration,
        tables,
        cells,
        failed_regions,
    } = params;

    metrics::counter!("pages_processed_total", "result" => if tables > 0 { "tables" } else { "empty" }).increment(1);
    metrics::counter!("tables_detected_total").increment(tables as u64);
    metrics::counter!("cells_detected_total").increment(cells as u64);
    metrics::histogram!("page_extraction_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("page_failed_regions").record(failed_regions as f64);
}

/// Record a single region-scoped failure
pub fn record_region_failure(kind: &'static str) {
    metrics::counter!("region_failures_total", "kind" => kind).increment(1);
}

/// Record cell recognition metrics
pub fn record_cell_recognition_metrics(success: bool, duration: std::time::Duration) {
    metrics::counter!("cells_recognized_total", "result" => if success { "success" } else { "failure" }).increment(1);
    metrics::histogram!("cell_recognition_duration_seconds").record(duration.as_secs_f64());
}
