//! Per-file outcomes and batch summaries.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;

use crate::error::PipelineError;

/// Result of one unit of work in a media stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A new output was written.
    Processed,
    /// The output already existed; nothing was done.
    AlreadyDone,
    /// Dry run: the file would have been processed.
    Planned,
    /// The input file does not exist.
    MissingInput,
    /// The input produced nothing usable (no frames, no faces, aligner error).
    Unusable(String),
    /// An error was caught at the file boundary.
    Failed {
        kind: String,
        message: String,
        diagnostics: Option<String>,
    },
}

impl FileOutcome {
    pub fn unusable(reason: impl Into<String>) -> Self {
        Self::Unusable(reason.into())
    }
}

impl From<PipelineError> for FileOutcome {
    fn from(e: PipelineError) -> Self {
        Self::Failed {
            kind: e.kind().to_string(),
            message: e.to_string(),
            diagnostics: e.diagnostics(),
        }
    }
}

/// Counts for one stage run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub already_done: usize,
    pub planned: usize,
    pub missing: usize,
    pub unusable: usize,
    /// Names of files that failed.
    pub failed: Vec<String>,
}

impl BatchReport {
    pub fn record(&mut self, file: &str, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Processed => self.processed += 1,
            FileOutcome::AlreadyDone => self.already_done += 1,
            FileOutcome::Planned => self.planned += 1,
            FileOutcome::MissingInput => self.missing += 1,
            FileOutcome::Unusable(_) => self.unusable += 1,
            FileOutcome::Failed { .. } => self.failed.push(file.to_string()),
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.already_done + self.planned + self.missing + self.unusable + self.failed.len()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} already done, {} missing, {} unusable, {} failed",
            self.processed,
            self.already_done,
            self.missing,
            self.unusable,
            self.failed.len()
        )?;
        if self.planned > 0 {
            write!(f, ", {} planned", self.planned)?;
        }
        Ok(())
    }
}

/// Options shared by every stage run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Log planned work without running external tools or writing outputs.
    pub dry_run: bool,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

/// Progress bar for a batch of `len` files.
pub fn batch_progress(len: usize, label: &str, options: &RunOptions) -> ProgressBar {
    if !options.show_progress || options.dry_run {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix} [{bar:30}] {pos}/{len} {elapsed_precise} {msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_prefix(label.to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosei_media::MediaError;

    #[test]
    fn test_record_counts() {
        let mut report = BatchReport::default();
        report.record("a", &FileOutcome::Processed);
        report.record("b", &FileOutcome::AlreadyDone);
        report.record("c", &FileOutcome::MissingInput);
        report.record("d", &FileOutcome::unusable("no frames"));
        report.record("e", &PipelineError::from(MediaError::Timeout(1)).into());

        assert_eq!(report.processed, 1);
        assert_eq!(report.already_done, 1);
        assert_eq!(report.missing, 1);
        assert_eq!(report.unusable, 1);
        assert_eq!(report.failed, vec!["e".to_string()]);
        assert_eq!(report.total(), 5);
        assert_eq!(
            report.to_string(),
            "1 processed, 1 already done, 1 missing, 1 unusable, 1 failed"
        );
    }

    #[test]
    fn test_failed_outcome_carries_kind() {
        let outcome: FileOutcome = PipelineError::from(MediaError::ffmpeg_failed(
            "exit",
            Some("boom".to_string()),
            Some(1),
        ))
        .into();
        match outcome {
            FileOutcome::Failed {
                kind, diagnostics, ..
            } => {
                assert_eq!(kind, "FfmpegFailed");
                assert_eq!(diagnostics.as_deref(), Some("stderr:\nboom"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
