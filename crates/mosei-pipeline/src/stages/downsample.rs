//! Downsample stage: re-encode every manifest clip at the target frame rate.

use mosei_labels::read_manifest;
use mosei_media::{move_into_place, Transcoder};
use mosei_models::ClipId;

use super::scratch_dir;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::logging::StageLogger;
use crate::report::{batch_progress, BatchReport, FileOutcome, RunOptions};

/// Downsample every clip named in the manifest.
///
/// Fails only if the manifest cannot be read or the output directory cannot
/// be created.
pub async fn run_downsample<T: Transcoder + ?Sized>(
    config: &PipelineConfig,
    transcoder: &T,
    logger: &StageLogger,
    options: &RunOptions,
) -> PipelineResult<BatchReport> {
    let paths = &config.paths;
    let manifest = read_manifest(&paths.manifest_csv)?;
    logger.log_start(&format!(
        "{} clips from {} at {} fps",
        manifest.len(),
        paths.manifest_csv.display(),
        config.downsample.target_fps
    ));

    if !options.dry_run {
        tokio::fs::create_dir_all(&paths.downsampled_dir).await?;
    }

    let mut report = BatchReport::default();
    let bar = batch_progress(manifest.len(), "downsample", options);

    for clip in &manifest {
        bar.set_message(clip.to_string());
        let outcome = downsample_clip(config, transcoder, clip, options).await;
        logger.log_outcome(clip.as_str(), &outcome);
        report.record(clip.as_str(), &outcome);
        bar.inc(1);
    }

    bar.finish_and_clear();
    logger.log_completion(&report.to_string());
    Ok(report)
}

async fn downsample_clip<T: Transcoder + ?Sized>(
    config: &PipelineConfig,
    transcoder: &T,
    clip: &ClipId,
    options: &RunOptions,
) -> FileOutcome {
    let input = config.paths.raw_video_dir.join(clip.as_str());
    let output = config.paths.downsampled_dir.join(clip.as_str());

    if output.exists() {
        return FileOutcome::AlreadyDone;
    }
    if !input.is_file() {
        return FileOutcome::MissingInput;
    }
    if options.dry_run {
        return FileOutcome::Planned;
    }

    let result: PipelineResult<()> = async {
        let scratch = scratch_dir(&config.paths.work_dir, "downsample-").await?;
        let staged = scratch.path().join(clip.as_str());
        transcoder
            .downsample(&input, &staged, &config.downsample)
            .await?;
        move_into_place(&staged, &output).await?;
        Ok(())
    }
    .await;

    match result {
        Ok(()) => FileOutcome::Processed,
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mosei_media::{MediaError, MediaResult};
    use mosei_models::DownsampleEncoding;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Copies the input and records every call; fails for names containing "bad".
    #[derive(Default)]
    struct CopyTranscoder {
        calls: Mutex<Vec<String>>,
    }

    impl CopyTranscoder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transcoder for CopyTranscoder {
        async fn downsample(
            &self,
            input: &Path,
            output: &Path,
            encoding: &DownsampleEncoding,
        ) -> MediaResult<()> {
            let name = input.file_name().unwrap().to_string_lossy().into_owned();
            self.calls.lock().unwrap().push(name.clone());
            assert_eq!(encoding.target_fps, 5);
            if name.contains("bad") {
                return Err(MediaError::ffmpeg_failed(
                    "FFmpeg exited with status 1",
                    Some("Invalid data found when processing input".to_string()),
                    Some(1),
                ));
            }
            tokio::fs::copy(input, output).await?;
            Ok(())
        }
    }

    fn setup(clips: &[&str], present: &[&str]) -> (TempDir, PipelineConfig) {
        let dir = TempDir::new().unwrap();
        let mut config = PipelineConfig::for_data_root(dir.path());
        config.paths.work_dir = dir.path().join("work");

        std::fs::create_dir_all(&config.paths.raw_video_dir).unwrap();
        for name in present {
            std::fs::write(config.paths.raw_video_dir.join(name), name.as_bytes()).unwrap();
        }

        let mut manifest = String::from("mp4_filename,FinalSentiment\n");
        for clip in clips {
            manifest.push_str(&format!("{},1.0\n", clip));
        }
        std::fs::create_dir_all(config.paths.manifest_csv.parent().unwrap()).unwrap();
        std::fs::write(&config.paths.manifest_csv, manifest).unwrap();

        (dir, config)
    }

    #[tokio::test]
    async fn test_downsample_batch_outcomes() {
        let (_dir, config) = setup(
            &["a_0.mp4", "bad_1.mp4", "gone_2.mp4", "c_3.mp4", "a_0.mp4"],
            &["a_0.mp4", "bad_1.mp4", "c_3.mp4"],
        );
        let transcoder = CopyTranscoder::default();
        let logger = StageLogger::new("downsample");

        let report = run_downsample(&config, &transcoder, &logger, &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.missing, 1);
        assert_eq!(report.failed, vec!["bad_1.mp4".to_string()]);
        assert_eq!(transcoder.calls(), vec!["a_0.mp4", "bad_1.mp4", "c_3.mp4"]);

        let out = &config.paths.downsampled_dir;
        assert_eq!(std::fs::read(out.join("a_0.mp4")).unwrap(), b"a_0.mp4");
        assert!(out.join("c_3.mp4").exists());
        assert!(!out.join("bad_1.mp4").exists());
        assert!(!out.join("gone_2.mp4").exists());
    }

    #[tokio::test]
    async fn test_downsample_rerun_is_idempotent() {
        let (_dir, config) = setup(&["a_0.mp4", "b_1.mp4"], &["a_0.mp4", "b_1.mp4"]);
        let transcoder = CopyTranscoder::default();
        let logger = StageLogger::new("downsample");
        let options = RunOptions::default();

        run_downsample(&config, &transcoder, &logger, &options)
            .await
            .unwrap();
        let before = std::fs::read(config.paths.downsampled_dir.join("a_0.mp4")).unwrap();

        let report = run_downsample(&config, &transcoder, &logger, &options)
            .await
            .unwrap();

        assert_eq!(report.already_done, 2);
        assert_eq!(report.processed, 0);
        assert_eq!(transcoder.calls().len(), 2);
        assert_eq!(
            std::fs::read(config.paths.downsampled_dir.join("a_0.mp4")).unwrap(),
            before
        );
    }

    #[tokio::test]
    async fn test_downsample_existing_output_checked_before_input() {
        let (_dir, config) = setup(&["done_0.mp4"], &[]);
        std::fs::create_dir_all(&config.paths.downsampled_dir).unwrap();
        std::fs::write(config.paths.downsampled_dir.join("done_0.mp4"), b"x").unwrap();

        let transcoder = CopyTranscoder::default();
        let report = run_downsample(
            &config,
            &transcoder,
            &StageLogger::new("downsample"),
            &RunOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.already_done, 1);
        assert_eq!(report.missing, 0);
    }

    #[tokio::test]
    async fn test_downsample_dry_run_writes_nothing() {
        let (_dir, config) = setup(&["a_0.mp4"], &["a_0.mp4"]);
        let transcoder = CopyTranscoder::default();
        let options = RunOptions {
            dry_run: true,
            show_progress: false,
        };

        let report = run_downsample(&config, &transcoder, &StageLogger::new("downsample"), &options)
            .await
            .unwrap();

        assert_eq!(report.planned, 1);
        assert!(transcoder.calls().is_empty());
        assert!(!config.paths.downsampled_dir.exists());
    }

    #[tokio::test]
    async fn test_downsample_missing_manifest_is_setup_error() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::for_data_root(dir.path());

        let result = run_downsample(
            &config,
            &CopyTranscoder::default(),
            &StageLogger::new("downsample"),
            &RunOptions::default(),
        )
        .await;

        assert!(result.is_err());
    }
}
