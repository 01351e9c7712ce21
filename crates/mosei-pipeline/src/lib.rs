//! Batch stages for MOSEI preprocessing.
//!
//! Each stage reads from and writes to the paths in [`PipelineConfig`]:
//!
//! 1. [`run_downsample`]: source clips to a fixed frame rate
//! 2. [`run_faces`]: downsampled clips to aligned face-crop videos
//! 3. [`run_merge`]: raw annotation exports to one merged table
//! 4. [`run_average`] / [`run_majority`]: merged judgments to per-clip labels

pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod stages;

pub use config::{PipelineConfig, PipelinePaths};
pub use error::{PipelineError, PipelineResult};
pub use logging::StageLogger;
pub use report::{BatchReport, FileOutcome, RunOptions};
pub use stages::{run_average, run_downsample, run_faces, run_majority, run_merge};
