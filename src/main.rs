//! Gradesheet - concurrent grade-sheet analyzer
//!
//! Reads a CSV grade sheet from a file or URL and reports per-component
//! averages, cohort branch averages, top scorers per component and rows
//! whose recorded total does not add up.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable sheet, no valid records, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod parser;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, ExportFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::{Record, ReportDocument, ReportMetadata};
use source::{FetchOptions, SheetSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("Gradesheet v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run_analysis(args, config).await {
        error!("Analysis failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .gradesheet.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change the cohort marker, joint-branch separators or max marks.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Load the configuration file, if any, and apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };

    config.merge_with_args(args);
    Ok(config)
}

/// Run the complete workflow: fetch, parse, aggregate, render, export.
async fn run_analysis(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Get the sheet
    let sheet = SheetSource::parse(args.source());
    if let SheetSource::Remote(ref url) = sheet {
        println!("Processing file from URL: {}", url);
    }

    let fetch_options = FetchOptions {
        timeout: Duration::from_secs(config.source.timeout_seconds),
        show_progress: !args.quiet,
    };
    let data = source::fetch_sheet(&sheet, &fetch_options)
        .await
        .with_context(|| format!("Failed to load grade sheet from {}", args.source()))?;

    // Step 2: Parse rows into records
    let records: Vec<Record> = parser::parse_sheet(&data, args.class.as_deref())
        .context("Failed to process grade sheet")?;
    let record_count = records.len();

    // Step 3: Aggregate
    let filter = analysis::CohortFilter::from(&config.cohort);
    let cohort_marker = filter.marker.clone();
    let summary = analysis::aggregate(Arc::from(records), filter).await;

    info!(
        "Aggregated {} records in {:.2}s",
        record_count,
        start_time.elapsed().as_secs_f64()
    );

    let document = ReportDocument {
        metadata: ReportMetadata {
            source: args.source().to_string(),
            generated_at: Utc::now(),
            record_count,
            class_filter: args.class.clone(),
            cohort_marker,
        },
        summary,
    };

    // Step 4: Print the report
    let max_marks = &config.report.max_marks;
    print!("{}", report::generate_text_report(&document, max_marks));

    // Step 5: Export if requested
    if let Some(format) = args.export {
        let path = config
            .general
            .output
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| format.default_path());

        let content = match format {
            ExportFormat::Json => report::generate_json_report(&document)?,
            ExportFormat::Markdown => report::generate_markdown_report(&document, max_marks),
        };

        report::write_report(&content, &path)?;
        println!("Report exported to {}", path.display());
    }

    Ok(())
}
