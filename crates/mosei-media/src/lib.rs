#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and face-alignment boundary.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2` with captured diagnostics
//! - FFprobe metadata (frame rate, dimensions)
//! - Downsampling, frame decoding and frame-sequence encoding
//! - The external face aligner call and normalization of its output
//!
//! The [`Transcoder`], [`FrameCodec`] and [`FaceAligner`] traits are the seams
//! the pipeline stages depend on; [`Ffmpeg`] and [`CommandAligner`] are the
//! production implementations.

pub mod align;
pub mod command;
pub mod downsample;
pub mod error;
pub mod ffmpeg;
pub mod frames;
pub mod fs_utils;
pub mod probe;
pub mod progress;

pub use align::{
    normalize_alignment, AlignerConfig, AlignmentOutcome, AlignmentRequest, CommandAligner,
    FaceAligner,
};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use downsample::{build_downsample_command, Transcoder};
pub use error::{MediaError, MediaResult};
pub use ffmpeg::Ffmpeg;
pub use frames::{load_images, FrameCodec};
pub use fs_utils::{list_file_names, list_files_with_extension, move_into_place};
pub use probe::{probe_frame_rate, probe_video, VideoInfo};
pub use progress::FfmpegProgress;
