//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        stdout: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Face aligner not found: {0}")]
    AlignerNotFound(String),

    #[error("Face aligner failed: {message}")]
    AlignerFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            stdout: None,
            exit_code,
        }
    }

    /// Create an aligner failure error.
    pub fn aligner_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::AlignerFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short name of the error variant, used when logging per-file failures.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaError::FfmpegNotFound => "FfmpegNotFound",
            MediaError::FfprobeNotFound => "FfprobeNotFound",
            MediaError::FfmpegFailed { .. } => "FfmpegFailed",
            MediaError::FfprobeFailed { .. } => "FfprobeFailed",
            MediaError::AlignerNotFound(_) => "AlignerNotFound",
            MediaError::AlignerFailed { .. } => "AlignerFailed",
            MediaError::FileNotFound(_) => "FileNotFound",
            MediaError::Timeout(_) => "Timeout",
            MediaError::Io(_) => "Io",
            MediaError::JsonParse(_) => "JsonParse",
            MediaError::Image(_) => "Image",
            MediaError::InvalidVideo(_) => "InvalidVideo",
            MediaError::Internal(_) => "Internal",
        }
    }

    /// Captured diagnostic output of a failed external tool, if any.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            MediaError::FfmpegFailed { stderr, stdout, .. } => {
                let mut out = String::new();
                if let Some(stderr) = stderr.as_deref().filter(|s| !s.trim().is_empty()) {
                    out.push_str("stderr:\n");
                    out.push_str(stderr.trim_end());
                }
                if let Some(stdout) = stdout.as_deref().filter(|s| !s.trim().is_empty()) {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str("stdout:\n");
                    out.push_str(stdout.trim_end());
                }
                (!out.is_empty()).then_some(out)
            }
            MediaError::FfprobeFailed { stderr, .. } | MediaError::AlignerFailed { stderr, .. } => {
                stderr.clone().filter(|s| !s.trim().is_empty())
            }
            _ => None,
        }
    }
}
