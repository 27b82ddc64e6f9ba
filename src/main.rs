use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pdeffer::config::AppConfig;
use pdeffer::debug::{DebugSink, DirectorySink, NoopSink};
use pdeffer::detection::DetectionMode;
use pdeffer::document::DocumentProcessor;
use pdeffer::observability;
use pdeffer::recognition::TesseractRecognizer;
use pdeffer::GridConfig;
use tracing::info;

/// Extract ruled tables from scanned page images.
#[derive(Debug, Parser)]
#[command(name = "pdeffer", about, version)]
struct Cli {
    /// Page images, in document order
    #[arg(value_name = "PAGE", required = true)]
    pages: Vec<PathBuf>,

    /// Detect tables from crossing ruling lines instead of contour area
    #[arg(long)]
    hough: bool,

    /// Write intermediate stage images to this directory
    #[arg(long, value_name = "DIR")]
    debug_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Report cell geometry only, without text recognition
    #[arg(long)]
    no_ocr: bool,

    /// JSON file with grid extraction settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Paginated plain text
    Text,
    /// JSON document report
    Json,
}

fn build_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;

    // An explicit grid file wins over PDEFFER_GRID_CONFIG
    if let Some(path) = &cli.config {
        config.grid = GridConfig::from_json_file(path)?;
    }
    if cli.hough {
        config.grid.detection.mode = DetectionMode::LineIntersection;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<bool> {
    // Load configuration from the environment, then apply flags
    let config = build_config(&cli)?;

    // Initialize structured logging
    observability::init_tracing_with_config(&config.observability)?;
    info!("{}", config.summary());

    let sink: Box<dyn DebugSink> = match &cli.debug_dir {
        Some(dir) => Box::new(
            DirectorySink::create(dir)
                .with_context(|| format!("creating debug directory {}", dir.display()))?,
        ),
        None => Box::new(NoopSink),
    };

    let recognizer = if cli.no_ocr {
        None
    } else {
        Some(TesseractRecognizer::new(&config.recognition)?)
    };

    let mut processor = DocumentProcessor::new(&config.grid, &config.recognition, sink.as_ref());
    if let Some(recognizer) = &recognizer {
        processor = processor.with_recognizer(recognizer);
    }

    let report = processor.process_files(&cli.pages);

    match cli.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(report.failed_pages() == 0)
}

fn main() -> ExitCode {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
