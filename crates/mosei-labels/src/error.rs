//! Error types for annotation tables.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for label operations.
pub type LabelResult<T> = Result<T, LabelError>;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
}

impl LabelError {
    pub fn missing_column(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            path: path.into(),
            column: column.into(),
        }
    }
}
