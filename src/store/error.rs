use crate::types::anomaly::AnomalyTypeParseError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Dataset path exists but is not a directory: '{0}'")]
    NotADirectory(PathBuf),

    #[error("Failed to create data directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read metadata for dataset '{0}'")]
    Metadata(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing dataset '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode CSV rows for '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed to read CSV dataset '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Required column '{column}' not found in '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: &'static str, row: usize },

    #[error("Invalid processed_at timestamp '{value}' at row {row}")]
    InvalidTimestamp {
        value: String,
        row: usize,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid anomaly_type at row {row}")]
    InvalidAnomalyType {
        row: usize,
        #[source]
        source: AnomalyTypeParseError,
    },
}
