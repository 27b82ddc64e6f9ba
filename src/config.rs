//! # Unified Application Configuration
//!
//! Every tunable of the extraction engine lives in [`GridConfig`] and is threaded
//! through each stage call; nothing in the core hard-codes a kernel size or a
//! tolerance. The defaults were tuned empirically on 300 DPI scans and are not
//! derived from any calibration corpus, so treat them as starting points.
//!
//! [`AppConfig`] bundles the grid settings with the recognition and
//! observability settings used by the binary and supports environment overrides.

use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detection::DetectionMode;
use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;

/// Table region detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Which detection strategy to run
    pub mode: DetectionMode,
    /// Fixed gray level at or below which a pixel counts as ink (contour-area mode)
    pub ink_threshold: u8,
    /// Candidate boxes must be strictly wider than this (contour-area mode)
    pub min_table_width: u32,
    /// Candidate boxes must be strictly taller than this (contour-area mode)
    pub min_table_height: u32,
    /// Length of the opening element used to isolate long strokes (line-intersection mode)
    pub stroke_kernel_len: u32,
    /// Number of erosions, then dilations, in each opening (line-intersection mode)
    pub stroke_iterations: u32,
    /// Candidate boxes must exceed this in both dimensions (line-intersection mode)
    pub min_skeleton_size: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            mode: DetectionMode::ContourArea,
            ink_threshold: 180,
            min_table_width: 100,
            min_table_height: 50,
            stroke_kernel_len: 40,
            stroke_iterations: 2,
            min_skeleton_size: 50,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.stroke_kernel_len == 0 {
            return Err(AppError::Config(
                "stroke_kernel_len must be greater than 0".to_string(),
            ));
        }
        if self.stroke_iterations == 0 {
            return Err(AppError::Config(
                "stroke_iterations must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ruling line extraction and refinement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Structuring element length is the region dimension divided by this
    pub kernel_divisor: u32,
    /// Lower bound on the structuring element length
    pub min_kernel_len: u32,
    /// Horizontal components narrower than this are discarded as noise
    pub min_horizontal_len: u32,
    /// Vertical components shorter than this are discarded as noise
    pub min_vertical_len: u32,
    /// Lines this thick or thinner trigger the refinement pass
    pub thin_line_threshold: u32,
    /// Thickness assumed when either axis has no measurable line
    pub fallback_thickness: u32,
    /// Side of the square element used to strengthen thin lines
    pub refine_kernel_size: u32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            kernel_divisor: 20,
            min_kernel_len: 10,
            min_horizontal_len: 30,
            min_vertical_len: 70,
            thin_line_threshold: 2,
            fallback_thickness: 3,
            refine_kernel_size: 3,
        }
    }
}

impl LineConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.kernel_divisor == 0 {
            return Err(AppError::Config(
                "kernel_divisor must be greater than 0".to_string(),
            ));
        }
        if self.min_kernel_len == 0 {
            return Err(AppError::Config(
                "min_kernel_len must be greater than 0".to_string(),
            ));
        }
        if self.refine_kernel_size == 0 {
            return Err(AppError::Config(
                "refine_kernel_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration threaded through every grid extraction stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub detection: DetectionConfig,
    pub lines: LineConfig,
    /// Merge distance for x positions derived from vertical lines
    pub x_tolerance: u32,
    /// Merge distance for y positions derived from horizontal lines (noisier)
    pub y_tolerance: u32,
    /// Cells whose top edges differ by less than this share a row
    pub row_tolerance: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            lines: LineConfig::default(),
            x_tolerance: 5,
            y_tolerance: 8,
            row_tolerance: 10,
        }
    }
}

impl GridConfig {
    /// Returns the configuration with a different detection strategy.
    pub fn with_mode(mut self, mode: DetectionMode) -> Self {
        self.detection.mode = mode;
        self
    }

    /// Loads a grid configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read grid config '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: GridConfig = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!(
                "Failed to parse grid config '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.detection.validate()?;
        self.lines.validate()?;
        if self.row_tolerance == 0 {
            return Err(AppError::Config(
                "row_tolerance must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSegMode {
    /// Fully automatic page segmentation
    Auto,
    /// Assume a single column of text
    SingleColumn,
    /// Assume a single uniform block of text
    #[default]
    SingleBlock,
    /// Treat the image as a single text line
    SingleLine,
    /// Treat the image as a single word
    SingleWord,
    /// Find as much text as possible in no particular order
    SparseText,
}

impl PageSegMode {
    /// Convert PSM mode to string value for Tesseract
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SingleLine => "7",
            PageSegMode::SingleWord => "8",
            PageSegMode::SparseText => "11",
        }
    }
}

/// Cell recognition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// OCR language codes (e.g., "eng", "eng+fra", "deu")
    pub languages: String,
    /// Page segmentation mode applied to every cell
    pub psm_mode: PageSegMode,
    /// Explicit tessdata directory; `None` lets Tesseract pick its default
    pub tessdata_path: Option<String>,
    /// White border added around each cell before recognition
    pub cell_padding: u32,
    /// CLAHE clip limit applied to the padded cell
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid (columns, rows)
    pub clahe_tile_grid: (u32, u32),
    /// Character whitelist to restrict OCR output
    pub character_whitelist: Option<String>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            languages: "eng".to_string(),
            psm_mode: PageSegMode::default(),
            tessdata_path: None,
            cell_padding: 5,
            clahe_clip_limit: 2.0,
            clahe_tile_grid: (4, 4),
            character_whitelist: None,
        }
    }
}

impl RecognitionConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AppError::Config(
                "languages cannot be empty".to_string(),
            ));
        }
        if self.clahe_clip_limit <= 0.0 {
            return Err(AppError::Config(format!(
                "clahe_clip_limit must be greater than 0 (got {})",
                self.clahe_clip_limit
            )));
        }
        if self.clahe_tile_grid.0 == 0 || self.clahe_tile_grid.1 == 0 {
            return Err(AppError::Config(
                "clahe_tile_grid dimensions must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Grid extraction configuration
    pub grid: GridConfig,
    /// Cell recognition configuration
    pub recognition: RecognitionConfig,
    /// Logging configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// `PDEFFER_GRID_CONFIG` points at an optional JSON grid file; individual
    /// `PDEFFER_*` variables override single fields on top of it.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = env::var("PDEFFER_GRID_CONFIG") {
            config.grid = GridConfig::from_json_file(path)?;
        }

        config.grid.detection.mode = env_or("PDEFFER_DETECTION_MODE", config.grid.detection.mode)?;
        config.grid.x_tolerance = env_or("PDEFFER_X_TOLERANCE", config.grid.x_tolerance)?;
        config.grid.y_tolerance = env_or("PDEFFER_Y_TOLERANCE", config.grid.y_tolerance)?;
        config.grid.row_tolerance = env_or("PDEFFER_ROW_TOLERANCE", config.grid.row_tolerance)?;
        config.grid.lines.kernel_divisor =
            env_or("PDEFFER_KERNEL_DIVISOR", config.grid.lines.kernel_divisor)?;

        if let Ok(languages) = env::var("PDEFFER_OCR_LANGUAGES") {
            config.recognition.languages = languages;
        }
        config.recognition.tessdata_path = env::var("TESSDATA_PREFIX").ok();

        config.observability = ObservabilityConfig::from_env();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.grid.validate()?;
        self.recognition.validate()?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: detection_mode={}, tolerances=x{}/y{}/row{}, ocr_languages={}, log_level={}",
            self.grid.detection.mode,
            self.grid.x_tolerance,
            self.grid.y_tolerance,
            self.grid.row_tolerance,
            self.recognition.languages,
            self.observability.log_level
        )
    }
}

fn env_or<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_grid_config_defaults() {
        let config = GridConfig::default();

        assert_eq!(config.detection.mode, DetectionMode::ContourArea);
        assert_eq!(config.detection.ink_threshold, 180);
        assert_eq!(config.lines.kernel_divisor, 20);
        assert_eq!(config.lines.min_kernel_len, 10);
        assert_eq!(config.lines.min_horizontal_len, 30);
        assert_eq!(config.lines.min_vertical_len, 70);
        assert_eq!(config.x_tolerance, 5);
        assert_eq!(config.y_tolerance, 8);
        assert_eq!(config.row_tolerance, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[allow(unused_assignments)]
    fn test_grid_config_validation() {
        let mut config = GridConfig::default();

        config.lines.kernel_divisor = 0;
        assert!(config.validate().is_err());
        config.lines.kernel_divisor = 20;

        config.detection.stroke_iterations = 0;
        assert!(config.validate().is_err());
        config.detection.stroke_iterations = 2;

        config.row_tolerance = 0;
        assert!(config.validate().is_err());
        config.row_tolerance = 10;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grid_config_from_partial_json() {
        let mut file = NamedTempFile::new().expect("temp file should be created");
        write!(
            file,
            r#"{{ "x_tolerance": 3, "detection": {{ "mode": "line_intersection" }} }}"#
        )
        .expect("temp file should be writable");

        let config = GridConfig::from_json_file(file.path()).expect("partial config should parse");
        assert_eq!(config.x_tolerance, 3);
        assert_eq!(config.y_tolerance, 8);
        assert_eq!(config.detection.mode, DetectionMode::LineIntersection);
        assert_eq!(config.detection.min_table_width, 100);
    }

    #[test]
    fn test_grid_config_from_invalid_json() {
        let mut file = NamedTempFile::new().expect("temp file should be created");
        write!(file, "not json").expect("temp file should be writable");
        assert!(matches!(
            GridConfig::from_json_file(file.path()),
            Err(AppError::Config(_))
        ));
        assert!(GridConfig::from_json_file("/nonexistent/grid.json").is_err());
    }

    #[test]
    fn test_recognition_config_validation() {
        let mut config = RecognitionConfig::default();
        assert_eq!(config.psm_mode.as_str(), "6");
        assert_eq!(config.cell_padding, 5);
        assert!(config.validate().is_ok());

        config.languages = "  ".to_string();
        assert!(config.validate().is_err());

        let config = RecognitionConfig {
            clahe_tile_grid: (0, 4),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_app_config_summary_mentions_mode() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.summary().contains("detection_mode=contour_area"));
    }
}
