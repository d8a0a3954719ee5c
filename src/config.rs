//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.gradesheet.toml` files.

use crate::models::Quantity;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".gradesheet.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Source acquisition settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Branch-average cohort settings.
    #[serde(default)]
    pub cohort: CohortConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Export path used when `--output` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Settings for reading grade sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Timeout for fetching a sheet over HTTP, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Which records take part in the branch averages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortConfig {
    /// Substring a batch label must contain, e.g. the intake year.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Substrings that mark a branch label as a dual program.
    #[serde(default = "default_joint_separators")]
    pub joint_separators: Vec<String>,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            joint_separators: default_joint_separators(),
        }
    }
}

fn default_marker() -> String {
    "2024".to_string()
}

fn default_joint_separators() -> Vec<String> {
    vec!["&".to_string(), "+".to_string()]
}

/// Report rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum marks per quantity, used for percentages.
    #[serde(default)]
    pub max_marks: MaxMarks,
}

/// Maximum attainable marks per quantity, indexed by `Quantity as usize`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "MaxMarksTable", into = "MaxMarksTable")]
pub struct MaxMarks([f64; 7]);

impl Default for MaxMarks {
    fn default() -> Self {
        Self([30.0, 75.0, 60.0, 30.0, 195.0, 105.0, 300.0])
    }
}

/// `[report.max_marks]` as written in the config file.
#[derive(Serialize, Deserialize)]
#[serde(default)]
struct MaxMarksTable {
    quiz: f64,
    mid_sem: f64,
    lab_test: f64,
    weekly_labs: f64,
    pre_compre: f64,
    compre: f64,
    total: f64,
}

impl Default for MaxMarksTable {
    fn default() -> Self {
        MaxMarks::default().into()
    }
}

impl From<MaxMarksTable> for MaxMarks {
    fn from(t: MaxMarksTable) -> Self {
        Self([
            t.quiz,
            t.mid_sem,
            t.lab_test,
            t.weekly_labs,
            t.pre_compre,
            t.compre,
            t.total,
        ])
    }
}

impl From<MaxMarks> for MaxMarksTable {
    fn from(marks: MaxMarks) -> Self {
        let [quiz, mid_sem, lab_test, weekly_labs, pre_compre, compre, total] = marks.0;
        Self {
            quiz,
            mid_sem,
            lab_test,
            weekly_labs,
            pre_compre,
            compre,
            total,
        }
    }
}

impl MaxMarks {
    /// Maximum marks for one quantity.
    pub fn get(&self, quantity: Quantity) -> f64 {
        self.0[quantity as usize]
    }

    /// `marks` as a percentage of the maximum for `quantity`.
    pub fn percentage(&self, quantity: Quantity, marks: f64) -> f64 {
        let max = self.get(quantity);
        if max > 0.0 {
            marks / max * 100.0
        } else {
            0.0
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.gradesheet.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when they were given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(ref marker) = args.cohort {
            self.cohort.marker = marker.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.cohort.marker, "2024");
        assert_eq!(config.cohort.joint_separators, vec!["&", "+"]);
        assert_eq!(config.report.max_marks.get(Quantity::PreCompre), 195.0);
        assert!(config.general.output.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "midsem_report.json"
verbose = true

[cohort]
marker = "2023"
joint_separators = ["&", "+", "/"]

[report.max_marks]
quiz = 40
total = 320
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("midsem_report.json"));
        assert!(config.general.verbose);
        assert_eq!(config.cohort.marker, "2023");
        assert_eq!(config.cohort.joint_separators.len(), 3);
        assert_eq!(config.report.max_marks.get(Quantity::Quiz), 40.0);
        assert_eq!(config.report.max_marks.get(Quantity::Total), 320.0);
        // Unlisted quantities keep their defaults.
        assert_eq!(config.report.max_marks.get(Quantity::Compre), 105.0);
        assert_eq!(config.source.timeout_seconds, 30);
    }

    #[test]
    fn test_percentage() {
        let marks = MaxMarks::default();
        assert_eq!(marks.percentage(Quantity::Total, 150.0), 50.0);
        assert_eq!(marks.percentage(Quantity::Quiz, 30.0), 100.0);

        let zero: MaxMarks = toml::from_str("quiz = 0").unwrap();
        assert_eq!(zero.percentage(Quantity::Quiz, 12.0), 0.0);
    }

    #[test]
    fn test_max_marks_keyed_by_quantity() {
        let marks: MaxMarks = toml::from_str("mid_sem = 80\npre_compre = 200").unwrap();

        let expected = [30.0, 80.0, 60.0, 30.0, 200.0, 105.0, 300.0];
        for (quantity, max) in Quantity::ALL.into_iter().zip(expected) {
            assert_eq!(marks.get(quantity), max, "{}", quantity);
        }

        let written = toml::to_string(&marks).unwrap();
        assert!(written.contains("mid_sem = 80.0"));
        assert!(written.contains("weekly_labs = 30.0"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[cohort]"));
        assert!(toml_str.contains("[report.max_marks]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.cohort.marker, "2024");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[source]\ntimeout_seconds = 5\n",
        )
        .unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.source.timeout_seconds, 5);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[cohort\nmarker = ").unwrap();

        assert!(Config::load(&path).is_err());
    }
}
