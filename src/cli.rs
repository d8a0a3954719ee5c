//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Gradesheet - concurrent grade-sheet analyzer
///
/// Reads a CSV grade sheet from disk or a URL and reports component
/// averages, branch averages, top scorers and total mismatches.
///
/// Examples:
///   gradesheet marks.csv
///   gradesheet marks.csv --class L3 --export json
///   gradesheet https://docs.google.com/spreadsheets/d/<ID>/edit --export markdown
///   gradesheet --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Grade sheet to analyze: a CSV file path or an http(s) URL
    ///
    /// Google Sheets share links are fetched through their CSV export.
    #[arg(value_name = "FILE_OR_URL", required_unless_present = "init_config")]
    pub source: Option<String>,

    /// Only include records of this class section
    #[arg(long, value_name = "CLASS")]
    pub class: Option<String>,

    /// Export the report to a file in this format
    #[arg(long, value_name = "FORMAT")]
    pub export: Option<ExportFormat>,

    /// Export file path
    ///
    /// Defaults to grade_report.json or grade_report.md depending on --export.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Batch marker selecting the cohort for branch averages
    ///
    /// Overrides the [cohort] marker from the config file (default "2024").
    #[arg(long, value_name = "MARKER", env = "GRADESHEET_COHORT")]
    pub cohort: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .gradesheet.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds when fetching a sheet by URL
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .gradesheet.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Export format for the report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// JSON document
    Json,
    /// Markdown document
    Markdown,
}

impl ExportFormat {
    /// Default export path for this format.
    pub fn default_path(self) -> PathBuf {
        match self {
            ExportFormat::Json => PathBuf::from("grade_report.json"),
            ExportFormat::Markdown => PathBuf::from("grade_report.md"),
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the source, empty if not set (should be validated first).
    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }

    /// Whether the source should be fetched over HTTP.
    pub fn is_remote(&self) -> bool {
        let source = self.source();
        source.starts_with("http://") || source.starts_with("https://")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        let source = self.source();
        if source.is_empty() {
            return Err("A grade sheet path or URL is required".to_string());
        }

        // Something that looks like a URL but isn't http(s)
        if source.contains("://") && !self.is_remote() {
            return Err("URL must start with 'http://' or 'https://'".to_string());
        }

        if !self.is_remote() {
            let path = std::path::Path::new(source);
            if !path.exists() {
                return Err(format!("File not found at {}", source));
            }
            if !path.is_file() {
                return Err(format!("Not a file: {}", source));
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref cohort) = self.cohort {
            if cohort.trim().is_empty() {
                return Err("Cohort marker must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            source: Some("https://example.com/marks.csv".to_string()),
            class: None,
            export: None,
            output: None,
            cohort: None,
            config: None,
            timeout: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "gradesheet",
            "marks.csv",
            "--class",
            "L3",
            "--export",
            "json",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.source(), "marks.csv");
        assert_eq!(args.class.as_deref(), Some("L3"));
        assert_eq!(args.export, Some(ExportFormat::Json));
        assert!(args.verbose);
    }

    #[test]
    fn test_source_required_without_init_config() {
        assert!(Args::try_parse_from(["gradesheet"]).is_err());
        assert!(Args::try_parse_from(["gradesheet", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_remote_source() {
        let args = make_args();
        assert!(args.is_remote());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_scheme() {
        let mut args = make_args();
        args.source = Some("ftp://example.com/marks.csv".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_file() {
        let mut args = make_args();
        args.source = Some("/definitely/not/here/marks.csv".to_string());
        let err = args.validate().unwrap_err();
        assert!(err.contains("File not found"));
    }

    #[test]
    fn test_validation_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args();
        args.source = Some(file.path().display().to_string());
        assert!(!args.is_remote());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout_and_blank_cohort() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.cohort = Some("  ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_export_default_paths() {
        assert_eq!(
            ExportFormat::Json.default_path(),
            PathBuf::from("grade_report.json")
        );
        assert_eq!(
            ExportFormat::Markdown.default_path(),
            PathBuf::from("grade_report.md")
        );
    }
}
