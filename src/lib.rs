//! # pdeffer
//!
//! Extracts ruled tables from scanned page images. For each page it locates
//! table regions, rebuilds the row and column grid from the ruling lines and
//! returns a row-major matrix of cell boxes. Cell text recognition and report
//! rendering sit on top of that geometry and are optional.

pub mod assembly;
pub mod clustering;
pub mod components;
pub mod config;
pub mod debug;
pub mod detection;
pub mod document;
pub mod errors;
pub mod geometry;
pub mod lines;
pub mod observability;
pub mod observability_config;
pub mod pipeline;
pub mod preprocessing;
pub mod recognition;
pub mod thickness;

// Re-export types for easier access
pub use config::{AppConfig, GridConfig, RecognitionConfig};
pub use detection::DetectionMode;
pub use document::{DocumentProcessor, DocumentReport, PageSource};
pub use errors::{AppError, AppResult, ExtractionError};
pub use geometry::{BoundingBox, Cell, Row, Table};
pub use pipeline::{extract_tables, GridExtractor, PageExtraction};
