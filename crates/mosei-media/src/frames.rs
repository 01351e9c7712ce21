//! Frame decoding, image loading and frame-sequence encoding.

use async_trait::async_trait;
use image::imageops::FilterType;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::debug;

use mosei_models::FaceVideoEncoding;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Filename pattern for decoded and re-encoded frame sequences.
pub const FRAME_PATTERN: &str = "%06d.png";

/// Rounds odd frame dimensions down to even ones, which yuv420p requires.
pub const EVEN_DIMENSIONS_FILTER: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";

/// Video decode/encode operations used by the face stage.
#[async_trait]
pub trait FrameCodec: Send + Sync {
    /// Decode every frame of `input` into `frames_dir`, returning the frame
    /// files in presentation order.
    async fn decode_frames(&self, input: &Path, frames_dir: &Path) -> MediaResult<Vec<PathBuf>>;

    /// Frame rate reported by the container, `None` when unknown.
    async fn frame_rate(&self, input: &Path) -> MediaResult<Option<f64>>;

    /// Encode `frames` in order into `output` at `fps`.
    async fn encode_frames(
        &self,
        frames: Vec<RgbImage>,
        fps: f64,
        output: &Path,
        encoding: &FaceVideoEncoding,
    ) -> MediaResult<()>;
}

/// FFmpeg command that dumps every frame of `input` as PNG into `frames_dir`.
pub fn build_decode_command(input: &Path, frames_dir: &Path) -> FfmpegCommand {
    FfmpegCommand::new(input, frames_dir.join(FRAME_PATTERN)).no_audio()
}

/// FFmpeg command that encodes the PNG sequence in `frames_dir` into `output`.
pub fn build_encode_command(
    frames_dir: &Path,
    fps: f64,
    output: &Path,
    encoding: &FaceVideoEncoding,
) -> FfmpegCommand {
    FfmpegCommand::new(frames_dir.join(FRAME_PATTERN), output)
        .input_frame_rate(fps)
        .video_filter(EVEN_DIMENSIONS_FILTER)
        .video_codec(&encoding.codec)
        .quality(encoding.quality)
        .pixel_format("yuv420p")
}

/// Load the usable entries of an aligned-frame list.
///
/// Entries that are blank, missing on disk or not decodable as an image are
/// dropped; the order of the rest is kept.
pub fn load_images(paths: &[PathBuf]) -> Vec<RgbImage> {
    paths
        .iter()
        .filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty() && p.is_file())
        .filter_map(|p| match image::open(p) {
            Ok(img) => Some(img.to_rgb8()),
            Err(e) => {
                debug!("Discarding unreadable frame {}: {}", p.display(), e);
                None
            }
        })
        .collect()
}

/// Resize every frame to the first frame's dimensions.
pub fn conform_to_first(frames: Vec<RgbImage>) -> Vec<RgbImage> {
    let Some((width, height)) = frames.first().map(|f| f.dimensions()) else {
        return frames;
    };

    frames
        .into_iter()
        .map(|frame| {
            if frame.dimensions() == (width, height) {
                frame
            } else {
                image::imageops::resize(&frame, width, height, FilterType::Triangle)
            }
        })
        .collect()
}

/// Write `frames` as a numbered PNG sequence matching [`FRAME_PATTERN`].
pub fn write_frame_sequence(frames: &[RgbImage], dir: &Path) -> MediaResult<()> {
    for (i, frame) in frames.iter().enumerate() {
        frame.save(dir.join(format!("{:06}.png", i + 1)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
    }

    #[test]
    fn test_load_images_skips_missing_blank_and_unreadable() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.png");
        solid(4, 4).save(&good).unwrap();
        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"not a png").unwrap();

        let paths = vec![
            PathBuf::from(""),
            PathBuf::from("   "),
            dir.path().join("missing.png"),
            junk,
            good,
        ];

        let images = load_images(&paths);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].dimensions(), (4, 4));
    }

    #[test]
    fn test_conform_to_first() {
        let frames = conform_to_first(vec![solid(8, 6), solid(3, 3), solid(8, 6)]);
        assert!(frames.iter().all(|f| f.dimensions() == (8, 6)));
        assert!(conform_to_first(Vec::new()).is_empty());
    }

    #[test]
    fn test_write_frame_sequence_numbering() {
        let dir = TempDir::new().unwrap();
        write_frame_sequence(&[solid(2, 2), solid(2, 2)], dir.path()).unwrap();
        assert!(dir.path().join("000001.png").exists());
        assert!(dir.path().join("000002.png").exists());
    }

    #[test]
    fn test_encode_command() {
        let args = build_encode_command(
            Path::new("/tmp/f"),
            24.0,
            Path::new("out.mp4"),
            &FaceVideoEncoding::default(),
        )
        .build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-framerate 24 -i /tmp/f/%06d.png"));
        assert!(joined.contains("-c:v mpeg4 -q:v 5 -pix_fmt yuv420p out.mp4"));
    }
}
