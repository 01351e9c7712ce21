//! Video encoding configuration.

use serde::{Deserialize, Serialize};

/// Target frame rate of the downsample stage.
pub const DEFAULT_TARGET_FPS: u32 = 5;
/// Video codec used for every re-encode.
pub const DEFAULT_VIDEO_CODEC: &str = "mpeg4";
/// Quantizer passed as `-q:v` (lower is better).
pub const DEFAULT_QUALITY: u8 = 5;
/// Audio is copied verbatim when downsampling.
pub const AUDIO_COPY: &str = "copy";

/// Frame rate used when the input's rate is missing or implausible.
pub const DEFAULT_FACE_FPS: f64 = 25.0;
/// Highest plausible input frame rate.
pub const MAX_PLAUSIBLE_FPS: f64 = 120.0;

/// Settings for the downsample stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownsampleEncoding {
    /// Output frame rate
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Video codec
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Video quantizer (`-q:v`)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Audio codec, `copy` keeps the stream untouched
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
}

fn default_target_fps() -> u32 {
    DEFAULT_TARGET_FPS
}
fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_quality() -> u8 {
    DEFAULT_QUALITY
}
fn default_audio_codec() -> String {
    AUDIO_COPY.to_string()
}
fn default_face_fps() -> f64 {
    DEFAULT_FACE_FPS
}

impl Default for DownsampleEncoding {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            quality: DEFAULT_QUALITY,
            audio_codec: AUDIO_COPY.to_string(),
        }
    }
}

impl DownsampleEncoding {
    /// Returns a new config with updated frame rate.
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }
}

/// Settings for re-encoding aligned face frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceVideoEncoding {
    #[serde(default = "default_video_codec")]
    pub codec: String,

    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Fallback frame rate for inputs with no usable rate
    #[serde(default = "default_face_fps")]
    pub default_fps: f64,
}

impl Default for FaceVideoEncoding {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            quality: DEFAULT_QUALITY,
            default_fps: DEFAULT_FACE_FPS,
        }
    }
}

impl FaceVideoEncoding {
    /// Frame rate for an output given the input's reported rate.
    pub fn output_fps(&self, reported: Option<f64>) -> f64 {
        resolve_output_fps(reported, self.default_fps)
    }
}

/// Clamp a reported frame rate to (0, 120], substituting `fallback` otherwise.
pub fn resolve_output_fps(reported: Option<f64>, fallback: f64) -> f64 {
    match reported {
        Some(fps) if fps.is_finite() && fps > 0.0 && fps <= MAX_PLAUSIBLE_FPS => fps,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downsample_defaults() {
        let enc = DownsampleEncoding::default();
        assert_eq!(enc.target_fps, 5);
        assert_eq!(enc.codec, "mpeg4");
        assert_eq!(enc.quality, 5);
        assert_eq!(enc.audio_codec, "copy");
    }

    #[test]
    fn test_output_fps_keeps_plausible_rate() {
        let enc = FaceVideoEncoding::default();
        assert_eq!(enc.output_fps(Some(24.0)), 24.0);
        assert_eq!(enc.output_fps(Some(120.0)), 120.0);
    }

    #[test]
    fn test_output_fps_fallback() {
        let enc = FaceVideoEncoding::default();
        assert_eq!(enc.output_fps(Some(0.0)), 25.0);
        assert_eq!(enc.output_fps(Some(-3.0)), 25.0);
        assert_eq!(enc.output_fps(Some(120.5)), 25.0);
        assert_eq!(enc.output_fps(Some(f64::NAN)), 25.0);
        assert_eq!(enc.output_fps(None), 25.0);
    }

    #[test]
    fn test_serde_defaults() {
        let enc: DownsampleEncoding = serde_json::from_str("{\"target_fps\": 10}").unwrap();
        assert_eq!(enc.target_fps, 10);
        assert_eq!(enc.audio_codec, "copy");
    }
}
