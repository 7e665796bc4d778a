//! Error types for sitedata-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sitedata-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV tokenizing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Nothing left after the header rows were taken
    #[error("File has no data: {}", path.display())]
    NoData { path: PathBuf },

    /// The first row has no cells to name columns with
    #[error("no header columns found in '{}'", path.display())]
    EmptyHeader { path: PathBuf },

    /// Two columns share a name and the load options reject duplicates
    #[error("duplicate column name '{name}' in '{}'", path.display())]
    DuplicateColumn { path: PathBuf, name: String },

    /// A CSS selector failed to compile
    #[error("invalid selector: {0}")]
    Selector(String),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
