//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - Tracing span creation utilities

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::geometry::BoundingBox;
use crate::observability_config::{LogFormat, ObservabilityConfig};

/// Initialize structured logging with tracing and configuration
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("pdeffer={}", config.log_level).parse()?)
        .add_directive(format!("table_grid={}", config.log_level).parse()?);

    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?,
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Create a span covering one page
pub fn page_span(page_index: usize) -> tracing::Span {
    tracing::info_span!("page", page_index = page_index, component = "grid")
}

/// Create a span covering one table region
pub fn region_span(region: &BoundingBox) -> tracing::Span {
    tracing::debug_span!(
        "table_region",
        x1 = region.x1,
        y1 = region.y1,
        x2 = region.x2,
        y2 = region.y2,
        component = "grid"
    )
}

/// Create a span for cell recognition
pub fn recognition_span(operation: &str) -> tracing::Span {
    tracing::info_span!("ocr_operation", operation = operation, component = "ocr")
}
