//! Grade sheet acquisition from files and URLs.

pub mod fetcher;

pub use fetcher::{fetch_sheet, FetchOptions, SheetSource, SourceError};
