//! Face alignment boundary.
//!
//! The aligner is an external program, typically a thin wrapper around
//! LibreFace. Its output shape is not stable: it may
//! print a bare list of frame paths, a list of lists, a tuple whose first
//! element is the real result, or a serialized table when it fails
//! internally. [`normalize_alignment`] folds all of these into
//! [`AlignmentOutcome`] so callers never inspect raw JSON.
//!
//! # Wire contract
//!
//! The program is run as `<program> <args...>`, where `{frames_dir}` and
//! `{output_dir}` in the args are replaced by the decoded-frame directory and
//! a directory the aligner may write crops into. The ordered frame paths are
//! written to its stdin as a JSON array of strings. It must print one JSON
//! document on stdout:
//!
//! | stdout | meaning |
//! |---|---|
//! | `["a.png", ...]` | flat list of aligned frame paths |
//! | `[["a.png"], ["b.png"]]` | nested list, flattened one level |
//! | `{"tuple": [result, ...]}` | tuple, only `result` is used |
//! | any other object, or a list starting with an object | tabular error sentinel |
//! | `null`, `[]` | nothing aligned |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Placeholder replaced by the decoded-frame directory.
pub const FRAMES_DIR_PLACEHOLDER: &str = "{frames_dir}";
/// Placeholder replaced by the aligner's output directory.
pub const OUTPUT_DIR_PLACEHOLDER: &str = "{output_dir}";

/// Normalized aligner result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentOutcome {
    /// Aligned frame paths in presentation order. Paths are not yet checked
    /// for existence.
    Frames(Vec<PathBuf>),
    /// The aligner reported a failure (tabular sentinel or unexpected shape).
    Error(String),
    /// Nothing was aligned.
    Empty,
}

/// One alignment call.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentRequest<'a> {
    /// Directory holding the decoded frames.
    pub frames_dir: &'a Path,
    /// Decoded frames in presentation order.
    pub frames: &'a [PathBuf],
    /// Directory the aligner may write its crops into.
    pub output_dir: &'a Path,
}

/// Produces aligned face crops for a sequence of frames.
#[async_trait]
pub trait FaceAligner: Send + Sync {
    async fn align(&self, request: AlignmentRequest<'_>) -> MediaResult<AlignmentOutcome>;
}

/// Fold any aligner output shape into an [`AlignmentOutcome`].
pub fn normalize_alignment(value: Value) -> AlignmentOutcome {
    let result = match value {
        Value::Object(mut map) if map.contains_key("tuple") => match map.remove("tuple") {
            Some(Value::Array(items)) => items.into_iter().next().unwrap_or(Value::Null),
            Some(other) => other,
            None => Value::Null,
        },
        other => other,
    };

    match result {
        Value::Null => AlignmentOutcome::Empty,
        Value::Object(_) => AlignmentOutcome::Error("aligner returned a table".to_string()),
        Value::Array(items) => normalize_list(items),
        other => AlignmentOutcome::Error(format!("aligner returned a bare {}", json_kind(&other))),
    }
}

fn normalize_list(items: Vec<Value>) -> AlignmentOutcome {
    let items = match items.first() {
        None => return AlignmentOutcome::Empty,
        Some(Value::Object(_)) => {
            return AlignmentOutcome::Error("aligner returned a table inside a list".to_string())
        }
        Some(Value::Array(_)) => items
            .into_iter()
            .flat_map(|item| match item {
                Value::Array(inner) => inner,
                other => vec![other],
            })
            .collect(),
        Some(_) => items,
    };

    let paths: Vec<PathBuf> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(PathBuf::from(s)),
            _ => None,
        })
        .collect();

    if paths.is_empty() {
        AlignmentOutcome::Empty
    } else {
        AlignmentOutcome::Frames(paths)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Configuration of the external aligner program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignerConfig {
    /// Program name or path
    pub program: String,
    /// Arguments, may contain the directory placeholders
    pub args: Vec<String>,
    /// Kill the aligner after this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            program: "libreface-align".to_string(),
            args: vec![
                FRAMES_DIR_PLACEHOLDER.to_string(),
                OUTPUT_DIR_PLACEHOLDER.to_string(),
            ],
            timeout_secs: None,
        }
    }
}

impl AlignerConfig {
    /// Arguments with placeholders substituted for one request.
    pub fn render_args(&self, frames_dir: &Path, output_dir: &Path) -> Vec<String> {
        let frames_dir = frames_dir.to_string_lossy();
        let output_dir = output_dir.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(FRAMES_DIR_PLACEHOLDER, &frames_dir)
                    .replace(OUTPUT_DIR_PLACEHOLDER, &output_dir)
            })
            .collect()
    }
}

/// [`FaceAligner`] that runs an external program speaking the JSON contract.
#[derive(Debug, Clone)]
pub struct CommandAligner {
    config: AlignerConfig,
}

impl CommandAligner {
    pub fn new(config: AlignerConfig) -> Self {
        Self { config }
    }

    /// Resolve the aligner program on `PATH`.
    pub fn check(&self) -> MediaResult<PathBuf> {
        which::which(&self.config.program)
            .map_err(|_| MediaError::AlignerNotFound(self.config.program.clone()))
    }
}

#[async_trait]
impl FaceAligner for CommandAligner {
    async fn align(&self, request: AlignmentRequest<'_>) -> MediaResult<AlignmentOutcome> {
        let program = self.check()?;
        let args = self.config.render_args(request.frames_dir, request.output_dir);
        debug!("Running aligner: {} {}", program.display(), args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let frame_list: Vec<String> = request
            .frames
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let payload = serde_json::to_vec(&frame_list)?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // The aligner may ignore stdin and exit early; a broken pipe is fine
                if let Err(e) = stdin.write_all(&payload).await {
                    debug!("Aligner did not consume the frame list: {}", e);
                }
            }
        };

        // Feed stdin while stdout and stderr are drained so no pipe fills up
        let run = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match self.config.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!("Aligner timed out after {} seconds", secs);
                    return Err(MediaError::Timeout(secs));
                }
            },
            None => run.await?,
        };

        if !output.status.success() {
            return Err(MediaError::aligner_failed(
                "Aligner exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
                output.status.code(),
            ));
        }

        let value: Value = serde_json::from_slice(&output.stdout)?;
        Ok(normalize_alignment(value))
    }
}
