//! Frame-rate downsampling.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use mosei_models::DownsampleEncoding;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Re-encodes a source video at a lower frame rate.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Write `input` re-encoded per `encoding` to `output`.
    async fn downsample(
        &self,
        input: &Path,
        output: &Path,
        encoding: &DownsampleEncoding,
    ) -> MediaResult<()>;
}

/// FFmpeg command for one downsample job.
///
/// Produces `ffmpeg -y -i <input> -r <fps> -c:v <codec> -q:v <q> -c:a copy <output>`
/// plus the runner's log-level and progress flags.
pub fn build_downsample_command(
    input: &Path,
    output: &Path,
    encoding: &DownsampleEncoding,
) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(input, output)
        .frame_rate(f64::from(encoding.target_fps))
        .video_codec(&encoding.codec)
        .quality(encoding.quality)
        .audio_codec(&encoding.audio_codec);

    debug!(
        "Downsample command for {}: {:?}",
        input.display(),
        cmd.build_args()
    );
    cmd
}
