//! Batch stages.
//!
//! Each stage reads its inputs from [`PipelinePaths`](crate::config::PipelinePaths),
//! processes one unit of work at a time and returns a summary. Per-file
//! errors are caught and reported; only setup errors are returned.

pub mod downsample;
pub mod faces;
pub mod labels;

pub use downsample::run_downsample;
pub use faces::run_faces;
pub use labels::{run_average, run_majority, run_merge};

use std::path::Path;
use tempfile::TempDir;

use crate::error::PipelineResult;

/// Per-file scratch directory under the work directory, removed on drop.
pub(crate) async fn scratch_dir(work_dir: &Path, prefix: &str) -> PipelineResult<TempDir> {
    tokio::fs::create_dir_all(work_dir).await?;
    Ok(tempfile::Builder::new().prefix(prefix).tempdir_in(work_dir)?)
}
