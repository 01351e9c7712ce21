//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] mosei_media::MediaError),

    #[error("Label error: {0}")]
    Labels(#[from] mosei_labels::LabelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Short name of the error, used when logging per-file failures.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ConfigError(_) => "ConfigError",
            PipelineError::Media(e) => e.kind(),
            PipelineError::Labels(_) => "LabelError",
            PipelineError::Io(_) => "Io",
        }
    }

    /// Captured output of the external tool behind this error, if any.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            PipelineError::Media(e) => e.diagnostics(),
            _ => None,
        }
    }
}
