use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CovidDataError>;

#[derive(Error, Debug)]
pub enum CovidDataError {
    #[error("Input file {} does not seem to exist", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Input file {} cannot be opened for reading: {reason}", path.display())]
    InputUnreadable { path: PathBuf, reason: String },

    #[error("Malformed input in {source_name} (line {line}, column {column}): {value:?} is not a number")]
    MalformedInput {
        source_name: String,
        line: usize,
        column: usize,
        value: String,
    },

    #[error("Malformed CSV in {source_name}: {reason}")]
    MalformedCsv { source_name: String, reason: String },

    #[error("Output directory {} cannot be created: {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
