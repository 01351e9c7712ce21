//! Pipeline configuration.

use std::path::{Path, PathBuf};

use mosei_media::AlignerConfig;
use mosei_models::encoding::MAX_PLAUSIBLE_FPS;
use mosei_models::{DownsampleEncoding, FaceVideoEncoding};

use crate::error::{PipelineError, PipelineResult};

/// Filesystem locations read and written by the stages.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePaths {
    /// Full-rate source clips (downsample input)
    pub raw_video_dir: PathBuf,
    /// Downsampled clips (downsample output, face input)
    pub downsampled_dir: PathBuf,
    /// Face-only clips (face output)
    pub face_dir: PathBuf,
    /// Directory whose listing decides which annotations are kept
    pub merge_media_dir: PathBuf,
    /// Raw annotation exports, merged in this order
    pub raw_annotations: Vec<PathBuf>,
    /// Merged annotation table
    pub merged_csv: PathBuf,
    /// Average-policy labels
    pub averaged_csv: PathBuf,
    /// Majority-policy labels
    pub majority_csv: PathBuf,
    /// Table listing the clips to downsample (`mp4_filename` column)
    pub manifest_csv: PathBuf,
    /// Scratch space for in-progress outputs and decoded frames
    pub work_dir: PathBuf,
}

impl PipelinePaths {
    /// Default layout under a data root.
    pub fn under(root: &Path) -> Self {
        let seg = root.join("MOSEI-Seg");
        let labels = root.join("Labels");
        let face_dir = seg.join("FaceCropped_mp4");
        let majority_csv = labels.join("majority_vote_sentiment.csv");

        Self {
            raw_video_dir: seg.join("Combined"),
            downsampled_dir: seg.join("Segmented_5fps"),
            merge_media_dir: face_dir.clone(),
            face_dir,
            raw_annotations: vec![
                labels.join("5000_batch_raw.csv"),
                labels.join("Batch_2980374_batch_results.csv"),
                labels.join("extreme_sentiment_results.csv"),
            ],
            merged_csv: labels.join("sentiment_mapped_mp4.csv"),
            averaged_csv: labels.join("averaged_sentiment.csv"),
            manifest_csv: majority_csv.clone(),
            majority_csv,
            work_dir: std::env::temp_dir().join("mosei-prep"),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub paths: PipelinePaths,
    pub downsample: DownsampleEncoding,
    pub faces: FaceVideoEncoding,
    pub aligner: AlignerConfig,
    /// Kill FFmpeg after this many seconds
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl PipelineConfig {
    /// Defaults for a data root, no environment overrides.
    pub fn for_data_root(root: impl AsRef<Path>) -> Self {
        Self {
            paths: PipelinePaths::under(root.as_ref()),
            downsample: DownsampleEncoding::default(),
            faces: FaceVideoEncoding::default(),
            aligner: AlignerConfig::default(),
            ffmpeg_timeout_secs: None,
        }
    }

    /// Create config from environment variables.
    pub fn from_env(root: impl AsRef<Path>) -> PipelineResult<Self> {
        Self::from_lookup(root, |key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (environment, tests).
    pub fn from_lookup<F>(root: impl AsRef<Path>, lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::for_data_root(root);
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let path_var = |key: &str, default: &mut PathBuf| {
            if let Some(v) = var(key) {
                *default = PathBuf::from(v);
            }
        };

        let paths = &mut config.paths;
        path_var("MOSEI_RAW_VIDEO_DIR", &mut paths.raw_video_dir);
        path_var("MOSEI_DOWNSAMPLED_DIR", &mut paths.downsampled_dir);
        path_var("MOSEI_FACE_DIR", &mut paths.face_dir);
        paths.merge_media_dir = paths.face_dir.clone();
        path_var("MOSEI_MERGE_MEDIA_DIR", &mut paths.merge_media_dir);
        path_var("MOSEI_MERGED_CSV", &mut paths.merged_csv);
        path_var("MOSEI_AVERAGED_CSV", &mut paths.averaged_csv);
        path_var("MOSEI_MAJORITY_CSV", &mut paths.majority_csv);
        paths.manifest_csv = paths.majority_csv.clone();
        path_var("MOSEI_MANIFEST_CSV", &mut paths.manifest_csv);
        path_var("MOSEI_WORK_DIR", &mut paths.work_dir);

        if let Some(list) = var("MOSEI_RAW_ANNOTATIONS") {
            paths.raw_annotations = list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
        }

        if let Some(v) = var("MOSEI_TARGET_FPS") {
            config.downsample.target_fps = parse_var("MOSEI_TARGET_FPS", &v)?;
        }
        if let Some(v) = var("MOSEI_DEFAULT_FPS") {
            config.faces.default_fps = parse_var("MOSEI_DEFAULT_FPS", &v)?;
        }
        if let Some(v) = var("FACE_ALIGNER_PROGRAM") {
            config.aligner.program = v;
        }
        if let Some(v) = var("FACE_ALIGNER_ARGS") {
            config.aligner.args = v.split_whitespace().map(String::from).collect();
        }
        if let Some(v) = var("FACE_ALIGNER_TIMEOUT_SECS") {
            config.aligner.timeout_secs = Some(parse_var("FACE_ALIGNER_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = var("FFMPEG_TIMEOUT_SECS") {
            config.ffmpeg_timeout_secs = Some(parse_var("FFMPEG_TIMEOUT_SECS", &v)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no stage can run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.downsample.target_fps == 0 {
            return Err(PipelineError::config_error("target fps must be positive"));
        }
        let fps = self.faces.default_fps;
        if !(fps > 0.0 && fps <= MAX_PLAUSIBLE_FPS) {
            return Err(PipelineError::config_error(format!(
                "default fps {} outside (0, {}]",
                fps, MAX_PLAUSIBLE_FPS
            )));
        }
        if self.aligner.program.trim().is_empty() {
            return Err(PipelineError::config_error("aligner program is empty"));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> PipelineResult<T> {
    value
        .parse()
        .map_err(|_| PipelineError::config_error(format!("{}: cannot parse '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_under_root() {
        let config = PipelineConfig::from_lookup("/data", lookup(&[])).unwrap();
        let paths = &config.paths;
        assert_eq!(paths.raw_video_dir, PathBuf::from("/data/MOSEI-Seg/Combined"));
        assert_eq!(paths.downsampled_dir, PathBuf::from("/data/MOSEI-Seg/Segmented_5fps"));
        assert_eq!(paths.merge_media_dir, paths.face_dir);
        assert_eq!(paths.manifest_csv, paths.majority_csv);
        assert_eq!(paths.raw_annotations.len(), 3);
        assert_eq!(config.downsample.target_fps, 5);
        assert_eq!(config.faces.default_fps, 25.0);
        assert_eq!(config.ffmpeg_timeout_secs, None);
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(
            "/data",
            lookup(&[
                ("MOSEI_FACE_DIR", "/faces"),
                ("MOSEI_MAJORITY_CSV", "/labels/maj.csv"),
                ("MOSEI_RAW_ANNOTATIONS", " /a.csv, ,/b.csv "),
                ("MOSEI_TARGET_FPS", "10"),
                ("FACE_ALIGNER_PROGRAM", "python3"),
                ("FACE_ALIGNER_ARGS", "align.py  {frames_dir} {output_dir}"),
                ("FFMPEG_TIMEOUT_SECS", "600"),
            ]),
        )
        .unwrap();

        // Derived defaults follow their overridden source
        assert_eq!(config.paths.merge_media_dir, PathBuf::from("/faces"));
        assert_eq!(config.paths.manifest_csv, PathBuf::from("/labels/maj.csv"));
        assert_eq!(
            config.paths.raw_annotations,
            vec![PathBuf::from("/a.csv"), PathBuf::from("/b.csv")]
        );
        assert_eq!(config.downsample.target_fps, 10);
        assert_eq!(config.aligner.program, "python3");
        assert_eq!(config.aligner.args, vec!["align.py", "{frames_dir}", "{output_dir}"]);
        assert_eq!(config.ffmpeg_timeout_secs, Some(600));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(PipelineConfig::from_lookup("/d", lookup(&[("MOSEI_TARGET_FPS", "fast")])).is_err());
        assert!(PipelineConfig::from_lookup("/d", lookup(&[("MOSEI_TARGET_FPS", "0")])).is_err());
        assert!(PipelineConfig::from_lookup("/d", lookup(&[("MOSEI_DEFAULT_FPS", "240")])).is_err());
    }
}
