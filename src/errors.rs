//! # Error Types
//!
//! This module defines the error types used throughout the extraction engine and
//! its collaborators, plus structured logging helpers for reporting them.
//!
//! Empty detections are deliberately absent: a page without tables or a table
//! without grid lines is an empty result, never an error.

use std::fmt;

use crate::geometry::BoundingBox;

/// Errors raised by the grid extraction core.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The page buffer or page file is malformed or unreadable
    Upstream(String),
    /// A region or cell has zero area once clamped to the page
    DegenerateGeometry { bbox: BoundingBox },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Upstream(msg) => {
                write!(f, "[UPSTREAM] Page image is unreadable: {}", msg)
            }
            ExtractionError::DegenerateGeometry { bbox } => write!(
                f,
                "[GEOMETRY] Region ({}, {}, {}, {}) has no area inside the page",
                bbox.x1, bbox.y1, bbox.x2, bbox.y2
            ),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Errors raised by text recognition collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionError {
    /// OCR engine initialization errors
    Initialization(String),
    /// The prepared cell image could not be handed to the engine
    ImageLoad(String),
    /// Text extraction errors
    Extraction(String),
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionError::Initialization(msg) => {
                write!(f, "[OCR_INIT] OCR engine initialization failed: {}", msg)
            }
            RecognitionError::ImageLoad(msg) => {
                write!(f, "[IMAGE_LOAD] Failed to load cell image for OCR: {}", msg)
            }
            RecognitionError::Extraction(msg) => {
                write!(f, "[OCR_EXTRACT] Text extraction from cell failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for RecognitionError {}

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Grid extraction errors
    Extraction(ExtractionError),
    /// Cell recognition errors
    Recognition(RecognitionError),
    /// File system errors
    FileSystem(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Extraction(err) => write!(f, "{}", err),
            AppError::Recognition(err) => write!(f, "{}", err),
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        AppError::Extraction(err)
    }
}

impl From<RecognitionError> for AppError {
    fn from(err: RecognitionError) -> Self {
        AppError::Recognition(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::{error, warn};

    use crate::geometry::BoundingBox;

    /// Log a region that failed while the rest of the page carried on
    pub fn log_region_failure(
        error: &impl std::fmt::Display,
        page_index: Option<usize>,
        region: &BoundingBox,
    ) {
        warn!(
            error = %error,
            page_index = ?page_index,
            region = ?(region.x1, region.y1, region.x2, region.y2),
            "Table region skipped"
        );
    }

    /// Log OCR errors with cell context
    pub fn log_recognition_error(
        error: &impl std::fmt::Display,
        operation: &str,
        cell: Option<&BoundingBox>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            cell = ?cell.map(|c| (c.x1, c.y1, c.x2, c.y2)),
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "Cell recognition failed"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_prefixes() {
        let upstream = ExtractionError::Upstream("truncated PNG".to_string());
        assert!(upstream.to_string().starts_with("[UPSTREAM]"));
        assert!(upstream.to_string().contains("truncated PNG"));

        let degenerate = ExtractionError::DegenerateGeometry {
            bbox: BoundingBox::new(4, 4, 4, 10),
        };
        assert!(degenerate.to_string().contains("(4, 4, 4, 10)"));

        let ocr = RecognitionError::Initialization("no tessdata".to_string());
        assert!(ocr.to_string().starts_with("[OCR_INIT]"));
    }

    #[test]
    fn test_app_error_conversions() {
        let app: AppError = ExtractionError::Upstream("bad".to_string()).into();
        assert!(matches!(app, AppError::Extraction(ExtractionError::Upstream(_))));

        let app: AppError = RecognitionError::Extraction("boom".to_string()).into();
        assert!(matches!(app, AppError::Recognition(_)));

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let app: AppError = io.into();
        assert!(matches!(app, AppError::FileSystem(_)));
        assert_eq!(AppError::Config("x".to_string()).to_string(), "[CONFIG] x");
    }
}
