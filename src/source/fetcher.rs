//! Grade sheet acquisition.
//!
//! This module reads a sheet from a local file or downloads it over HTTP,
//! rewriting Google Sheets share links to their CSV export endpoint.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while acquiring a grade sheet.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch URL: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bad status: {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid spreadsheet URL: {0}")]
    InvalidUrl(String),
}

/// Where a grade sheet lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSource {
    Local(PathBuf),
    Remote(String),
}

impl SheetSource {
    /// Classify a command-line source argument.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            SheetSource::Remote(source.to_string())
        } else {
            SheetSource::Local(PathBuf::from(source))
        }
    }
}

/// Options for fetching a sheet.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Whether to show a spinner while downloading.
    pub show_progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            show_progress: true,
        }
    }
}

/// Read the raw bytes of a grade sheet.
pub async fn fetch_sheet(source: &SheetSource, options: &FetchOptions) -> Result<Vec<u8>, SourceError> {
    match source {
        SheetSource::Local(path) => {
            info!("Reading grade sheet: {}", path.display());
            tokio::fs::read(path).await.map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })
        }
        SheetSource::Remote(url) => fetch_remote(url, options).await,
    }
}

async fn fetch_remote(url: &str, options: &FetchOptions) -> Result<Vec<u8>, SourceError> {
    let url = resolve_export_url(url)?;
    info!("Fetching grade sheet: {}", url);

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Downloading grade sheet...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = download(&url, options.timeout).await;

    if let Some(pb) = spinner {
        match result {
            Ok(ref bytes) => pb.finish_with_message(format!("Downloaded {} bytes", bytes.len())),
            Err(_) => pb.finish_and_clear(),
        }
    }

    result
}

async fn download(url: &str, timeout: Duration) -> Result<Vec<u8>, SourceError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let response = client.get(url).send().await?;
    let status = response.status();
    debug!("Response status: {}", status);

    if !status.is_success() {
        return Err(SourceError::Status(status));
    }

    Ok(response.bytes().await?.to_vec())
}

/// Rewrite a Google Sheets link to its CSV export URL.
///
/// Other URLs are returned unchanged.
pub fn resolve_export_url(url: &str) -> Result<String, SourceError> {
    if !url.contains("docs.google.com/spreadsheets") {
        return Ok(url.to_string());
    }

    let sheet_id = parse_sheet_id(url).ok_or_else(|| SourceError::InvalidUrl(url.to_string()))?;

    Ok(format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
        sheet_id
    ))
}

/// Extract the document id following the `/d/` path segment.
fn parse_sheet_id(url: &str) -> Option<&str> {
    let mut parts = url.split('/');
    parts.find(|part| *part == "d")?;

    let id = parts.next()?;
    let id = id.split(['?', '#']).next().unwrap_or(id);

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
