//! Face stage: replace each downsampled clip with a video of aligned face crops.
//!
//! For every clip without an output yet: decode its frames, hand them to the
//! aligner, load the crops it reports and encode them at the clip's own frame
//! rate (clamped, with a fallback when the container reports nonsense).

use tracing::{debug, warn};

use mosei_media::{
    list_file_names, list_files_with_extension, load_images, move_into_place, AlignmentOutcome,
    AlignmentRequest, FaceAligner, FrameCodec, MediaError,
};
use mosei_models::MEDIA_EXTENSION;

use super::scratch_dir;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::logging::StageLogger;
use crate::report::{batch_progress, BatchReport, FileOutcome, RunOptions};

/// Extract face videos for every downsampled clip not yet in the face directory.
pub async fn run_faces<C, A>(
    config: &PipelineConfig,
    codec: &C,
    aligner: &A,
    logger: &StageLogger,
    options: &RunOptions,
) -> PipelineResult<BatchReport>
where
    C: FrameCodec + ?Sized,
    A: FaceAligner + ?Sized,
{
    let paths = &config.paths;
    let inputs = list_files_with_extension(&paths.downsampled_dir, MEDIA_EXTENSION).await?;
    let done = list_file_names(&paths.face_dir).await?;
    let todo: Vec<String> = inputs
        .iter()
        .filter(|name| !done.contains(*name))
        .cloned()
        .collect();

    let mut report = BatchReport {
        already_done: inputs.len() - todo.len(),
        ..BatchReport::default()
    };
    logger.log_start(&format!(
        "{} of {} clips in {} to process",
        todo.len(),
        inputs.len(),
        paths.downsampled_dir.display()
    ));

    if !options.dry_run {
        tokio::fs::create_dir_all(&paths.face_dir).await?;
    }

    let bar = batch_progress(todo.len(), "faces", options);
    for name in &todo {
        bar.set_message(name.clone());
        let outcome = if options.dry_run {
            FileOutcome::Planned
        } else {
            match extract_faces(config, codec, aligner, name).await {
                Ok(outcome) => outcome,
                Err(e) => e.into(),
            }
        };
        logger.log_outcome(name, &outcome);
        report.record(name, &outcome);
        bar.inc(1);
    }

    bar.finish_and_clear();
    logger.log_completion(&report.to_string());
    Ok(report)
}

async fn extract_faces<C, A>(
    config: &PipelineConfig,
    codec: &C,
    aligner: &A,
    name: &str,
) -> PipelineResult<FileOutcome>
where
    C: FrameCodec + ?Sized,
    A: FaceAligner + ?Sized,
{
    let input = config.paths.downsampled_dir.join(name);
    let output = config.paths.face_dir.join(name);

    let scratch = scratch_dir(&config.paths.work_dir, "faces-").await?;
    let frames_dir = scratch.path().join("frames");
    let aligned_dir = scratch.path().join("aligned");
    tokio::fs::create_dir_all(&frames_dir).await?;
    tokio::fs::create_dir_all(&aligned_dir).await?;

    let frames = codec.decode_frames(&input, &frames_dir).await?;
    if frames.is_empty() {
        return Ok(FileOutcome::unusable("no frames decoded"));
    }
    debug!(file = name, frames = frames.len(), "Decoded frames");

    let request = AlignmentRequest {
        frames_dir: &frames_dir,
        frames: &frames,
        output_dir: &aligned_dir,
    };
    let aligned = match aligner.align(request).await? {
        AlignmentOutcome::Frames(paths) => paths,
        AlignmentOutcome::Error(reason) => {
            return Ok(FileOutcome::unusable(format!("aligner error: {}", reason)))
        }
        AlignmentOutcome::Empty => return Ok(FileOutcome::unusable("no faces aligned")),
    };

    let reported = aligned.len();
    let images = tokio::task::spawn_blocking(move || load_images(&aligned))
        .await
        .map_err(|e| MediaError::internal(format!("image loading task failed: {}", e)))?;
    if images.is_empty() {
        return Ok(FileOutcome::unusable("no readable face crops"));
    }
    if images.len() < reported {
        debug!(
            file = name,
            kept = images.len(),
            reported,
            "Dropped unusable face crops"
        );
    }

    let source_fps = match codec.frame_rate(&input).await {
        Ok(fps) => fps,
        Err(e) => {
            warn!(file = name, "Frame rate unavailable: {}", e);
            None
        }
    };
    let fps = config.faces.output_fps(source_fps);
    if source_fps != Some(fps) {
        debug!(file = name, ?source_fps, fps, "Using fallback frame rate");
    }

    let staged = scratch.path().join(name);
    codec
        .encode_frames(images, fps, &staged, &config.faces)
        .await?;
    move_into_place(&staged, &output).await?;

    Ok(FileOutcome::Processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use mosei_media::{normalize_alignment, MediaResult};
    use mosei_models::FaceVideoEncoding;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Decodes a fixed number of frames per clip and records encodes.
    #[derive(Default)]
    struct FakeCodec {
        frame_counts: HashMap<String, usize>,
        frame_rates: HashMap<String, f64>,
        encoded: Mutex<Vec<(String, usize, f64)>>,
    }

    impl FakeCodec {
        fn with_clip(mut self, name: &str, frames: usize, fps: Option<f64>) -> Self {
            self.frame_counts.insert(name.to_string(), frames);
            if let Some(fps) = fps {
                self.frame_rates.insert(name.to_string(), fps);
            }
            self
        }

        fn encoded(&self) -> Vec<(String, usize, f64)> {
            self.encoded.lock().unwrap().clone()
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[async_trait]
    impl FrameCodec for FakeCodec {
        async fn decode_frames(
            &self,
            input: &Path,
            frames_dir: &Path,
        ) -> MediaResult<Vec<PathBuf>> {
            let count = self.frame_counts.get(&file_name(input)).copied().unwrap_or(0);
            let mut frames = Vec::new();
            for i in 1..=count {
                let path = frames_dir.join(format!("{:06}.png", i));
                RgbImage::from_pixel(4, 4, Rgb([i as u8, 0, 0]))
                    .save(&path)
                    .unwrap();
                frames.push(path);
            }
            Ok(frames)
        }

        async fn frame_rate(&self, input: &Path) -> MediaResult<Option<f64>> {
            Ok(self.frame_rates.get(&file_name(input)).copied())
        }

        async fn encode_frames(
            &self,
            frames: Vec<RgbImage>,
            fps: f64,
            output: &Path,
            _encoding: &FaceVideoEncoding,
        ) -> MediaResult<()> {
            self.encoded
                .lock()
                .unwrap()
                .push((file_name(output), frames.len(), fps));
            tokio::fs::write(output, b"encoded").await?;
            Ok(())
        }
    }

    /// Answers every request with the aligner JSON produced by `respond`.
    struct FakeAligner<F> {
        respond: F,
    }

    #[async_trait]
    impl<F> FaceAligner for FakeAligner<F>
    where
        F: Fn(&[PathBuf]) -> serde_json::Value + Send + Sync,
    {
        async fn align(&self, request: AlignmentRequest<'_>) -> MediaResult<AlignmentOutcome> {
            Ok(normalize_alignment((self.respond)(request.frames)))
        }
    }

    fn passthrough() -> FakeAligner<impl Fn(&[PathBuf]) -> serde_json::Value + Send + Sync> {
        FakeAligner {
            respond: |frames: &[PathBuf]| {
                serde_json::json!(frames
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect::<Vec<_>>())
            },
        }
    }

    fn setup(clips: &[&str]) -> (TempDir, PipelineConfig) {
        let dir = TempDir::new().unwrap();
        let mut config = PipelineConfig::for_data_root(dir.path());
        config.paths.work_dir = dir.path().join("work");
        std::fs::create_dir_all(&config.paths.downsampled_dir).unwrap();
        for clip in clips {
            std::fs::write(config.paths.downsampled_dir.join(clip), b"video").unwrap();
        }
        std::fs::write(config.paths.downsampled_dir.join("notes.txt"), b"").unwrap();
        (dir, config)
    }

    async fn run<A: FaceAligner>(
        config: &PipelineConfig,
        codec: &FakeCodec,
        aligner: &A,
    ) -> BatchReport {
        run_faces(
            config,
            codec,
            aligner,
            &StageLogger::new("faces"),
            &RunOptions::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_faces_encodes_at_source_frame_rate() {
        let (_dir, config) = setup(&["a_0.mp4"]);
        let codec = FakeCodec::default().with_clip("a_0.mp4", 3, Some(24.0));

        let report = run(&config, &codec, &passthrough()).await;

        assert_eq!(report.processed, 1);
        assert_eq!(codec.encoded(), vec![("a_0.mp4".to_string(), 3, 24.0)]);
        assert_eq!(
            std::fs::read(config.paths.face_dir.join("a_0.mp4")).unwrap(),
            b"encoded"
        );
    }

    #[tokio::test]
    async fn test_faces_frame_rate_fallback() {
        let (_dir, config) = setup(&["a_0.mp4", "b_0.mp4", "c_0.mp4", "d_0.mp4", "e_0.mp4"]);
        let codec = FakeCodec::default()
            .with_clip("a_0.mp4", 1, Some(0.0))
            .with_clip("b_0.mp4", 1, Some(-1.0))
            .with_clip("c_0.mp4", 1, Some(121.0))
            .with_clip("d_0.mp4", 1, None)
            .with_clip("e_0.mp4", 1, Some(120.0));

        run(&config, &codec, &passthrough()).await;

        let rates: Vec<f64> = codec.encoded().into_iter().map(|(_, _, fps)| fps).collect();
        assert_eq!(rates, vec![25.0, 25.0, 25.0, 25.0, 120.0]);
    }

    #[tokio::test]
    async fn test_faces_skips_unusable_inputs() {
        let (_dir, config) = setup(&["blank_0.mp4", "table_0.mp4", "ok_0.mp4"]);
        let codec = FakeCodec::default()
            .with_clip("table_0.mp4", 2, Some(25.0))
            .with_clip("ok_0.mp4", 3, Some(25.0));
        // Two-frame clips get the tabular error sentinel
        let aligner = FakeAligner {
            respond: |frames: &[PathBuf]| {
                if frames.len() == 2 {
                    serde_json::json!({ "columns": ["face_id"], "data": [] })
                } else {
                    serde_json::json!(frames
                        .iter()
                        .map(|p| p.to_string_lossy().into_owned())
                        .collect::<Vec<_>>())
                }
            },
        };

        let report = run(&config, &codec, &aligner).await;

        assert_eq!(report.unusable, 2);
        assert_eq!(report.processed, 1);
        assert!(report.failed.is_empty());
        assert_eq!(codec.encoded(), vec![("ok_0.mp4".to_string(), 3, 25.0)]);
        assert!(!config.paths.face_dir.join("table_0.mp4").exists());
        assert!(!config.paths.face_dir.join("blank_0.mp4").exists());
    }

    #[tokio::test]
    async fn test_faces_drops_missing_crops() {
        let (_dir, config) = setup(&["a_0.mp4", "b_0.mp4"]);
        let codec = FakeCodec::default()
            .with_clip("a_0.mp4", 3, Some(25.0))
            .with_clip("b_0.mp4", 1, Some(25.0));
        // Tuple result whose list mixes real frames, blanks and missing files
        let aligner = FakeAligner {
            respond: |frames: &[PathBuf]| {
                let mut paths: Vec<serde_json::Value> = vec![
                    serde_json::json!(""),
                    serde_json::json!("/nonexistent/face.png"),
                ];
                if frames.len() > 1 {
                    paths.extend(
                        frames
                            .iter()
                            .skip(1)
                            .map(|p| serde_json::json!(p.to_string_lossy())),
                    );
                }
                serde_json::json!({ "tuple": [[paths], { "faces": frames.len() }] })
            },
        };

        let report = run(&config, &codec, &aligner).await;

        assert_eq!(report.processed, 1);
        assert_eq!(report.unusable, 1);
        assert_eq!(codec.encoded(), vec![("a_0.mp4".to_string(), 2, 25.0)]);
    }

    #[tokio::test]
    async fn test_faces_aligner_failure_does_not_stop_batch() {
        struct FailingAligner;

        #[async_trait]
        impl FaceAligner for FailingAligner {
            async fn align(&self, request: AlignmentRequest<'_>) -> MediaResult<AlignmentOutcome> {
                if request.frames.len() == 1 {
                    return Err(MediaError::aligner_failed(
                        "aligner exited with status 2",
                        Some("no model".to_string()),
                        Some(2),
                    ));
                }
                Ok(AlignmentOutcome::Frames(request.frames.to_vec()))
            }
        }

        let (_dir, config) = setup(&["a_0.mp4", "b_0.mp4"]);
        let codec = FakeCodec::default()
            .with_clip("a_0.mp4", 1, Some(25.0))
            .with_clip("b_0.mp4", 2, Some(25.0));

        let report = run(&config, &codec, &FailingAligner).await;

        assert_eq!(report.failed, vec!["a_0.mp4".to_string()]);
        assert_eq!(report.processed, 1);
    }

    #[tokio::test]
    async fn test_faces_rerun_is_idempotent() {
        let (_dir, config) = setup(&["a_0.mp4", "b_0.mp4"]);
        let codec = FakeCodec::default()
            .with_clip("a_0.mp4", 2, Some(25.0))
            .with_clip("b_0.mp4", 2, Some(25.0));

        let first = run(&config, &codec, &passthrough()).await;
        let second = run(&config, &codec, &passthrough()).await;

        assert_eq!(first.processed, 2);
        assert_eq!(second.processed, 0);
        assert_eq!(second.already_done, 2);
        assert_eq!(codec.encoded().len(), 2);
    }

    #[tokio::test]
    async fn test_faces_dry_run_plans_only() {
        let (_dir, config) = setup(&["a_0.mp4"]);
        let codec = FakeCodec::default().with_clip("a_0.mp4", 2, Some(25.0));
        let options = RunOptions {
            dry_run: true,
            show_progress: false,
        };

        let report = run_faces(&config, &codec, &passthrough(), &StageLogger::new("faces"), &options)
            .await
            .unwrap();

        assert_eq!(report.planned, 1);
        assert!(codec.encoded().is_empty());
        assert!(!config.paths.face_dir.exists());
    }
}
