//! FFmpeg-backed implementations of [`Transcoder`] and [`FrameCodec`].

use async_trait::async_trait;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::debug;

use mosei_models::{DownsampleEncoding, FaceVideoEncoding};

use crate::command::FfmpegRunner;
use crate::downsample::{build_downsample_command, Transcoder};
use crate::error::{MediaError, MediaResult};
use crate::frames::{
    build_decode_command, build_encode_command, conform_to_first, write_frame_sequence,
    FrameCodec,
};
use crate::fs_utils::list_files_with_extension;
use crate::probe::probe_frame_rate;

/// Media toolkit that shells out to `ffmpeg` and `ffprobe`.
#[derive(Debug, Clone, Default)]
pub struct Ffmpeg {
    runner: FfmpegRunner,
}

impl Ffmpeg {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn downsample(
        &self,
        input: &Path,
        output: &Path,
        encoding: &DownsampleEncoding,
    ) -> MediaResult<()> {
        let cmd = build_downsample_command(input, output, encoding);
        let name = input.display().to_string();

        self.runner
            .run_with_progress(&cmd, move |p| {
                debug!(
                    file = %name,
                    frame = p.frame,
                    out_time_ms = p.out_time_ms,
                    speed = p.speed,
                    "Downsample progress"
                );
            })
            .await
    }
}

#[async_trait]
impl FrameCodec for Ffmpeg {
    async fn decode_frames(&self, input: &Path, frames_dir: &Path) -> MediaResult<Vec<PathBuf>> {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }

        self.runner.run(&build_decode_command(input, frames_dir)).await?;

        // Zero-padded names sort in presentation order
        Ok(list_files_with_extension(frames_dir, "png")
            .await?
            .into_iter()
            .map(|name| frames_dir.join(name))
            .collect())
    }

    async fn frame_rate(&self, input: &Path) -> MediaResult<Option<f64>> {
        probe_frame_rate(input).await
    }

    async fn encode_frames(
        &self,
        frames: Vec<RgbImage>,
        fps: f64,
        output: &Path,
        encoding: &FaceVideoEncoding,
    ) -> MediaResult<()> {
        if frames.is_empty() {
            return Err(MediaError::internal("No frames to encode"));
        }

        let sequence_dir = tempfile::Builder::new()
            .prefix("encode-")
            .tempdir_in(output.parent().unwrap_or_else(|| Path::new(".")))?;
        let sequence_path = sequence_dir.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            write_frame_sequence(&conform_to_first(frames), &sequence_path)
        })
        .await
        .map_err(|e| MediaError::internal(format!("Frame writer task failed: {}", e)))??;

        let cmd = build_encode_command(sequence_dir.path(), fps, output, encoding);
        self.runner.run(&cmd).await
    }
}
