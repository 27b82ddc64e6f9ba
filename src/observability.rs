//! Observability module for logging, spans and metrics.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Span constructors for page and region processing
//! - Metrics recording through the `metrics` facade (no exporter is installed
//!   here; callers that want one register their own recorder)

pub mod metrics;
pub mod tracing_mod;

pub use self::metrics::{
    record_cell_recognition_metrics, record_page_metrics, record_region_failure,
    PageMetricsParams,
};
pub use self::tracing_mod::{init_tracing_with_config, page_span, recognition_span, region_span};
