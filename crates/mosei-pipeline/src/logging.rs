//! Structured stage logging utilities.
//!
//! Provides consistent, structured logging for batch stages with tracing
//! spans and contextual information.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use crate::report::FileOutcome;

/// Stage logger for structured logging with consistent formatting.
///
/// Every event carries the stage name and a run id so the output of
/// `all` can be split back into its stages.
#[derive(Debug, Clone)]
pub struct StageLogger {
    run_id: String,
    stage: String,
}

impl StageLogger {
    /// Create a logger for a stage under a fresh run id.
    pub fn new(stage: &str) -> Self {
        Self::with_run_id(&Uuid::new_v4().to_string(), stage)
    }

    /// Create a logger sharing an existing run id.
    pub fn with_run_id(run_id: &str, stage: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            stage: stage.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "Stage started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "{}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, stage = %self.stage, "{}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "Stage completed: {}", message);
    }

    /// Log the outcome of one unit of work at a level matching its severity.
    pub fn log_outcome(&self, file: &str, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Processed => {
                info!(run_id = %self.run_id, stage = %self.stage, file, "Saved")
            }
            FileOutcome::AlreadyDone => {
                info!(run_id = %self.run_id, stage = %self.stage, file, "Already processed")
            }
            FileOutcome::Planned => {
                info!(run_id = %self.run_id, stage = %self.stage, file, "[dry-run] Would process")
            }
            FileOutcome::MissingInput => {
                warn!(run_id = %self.run_id, stage = %self.stage, file, "Skipping missing input")
            }
            FileOutcome::Unusable(reason) => {
                warn!(run_id = %self.run_id, stage = %self.stage, file, "Skipping: {}", reason)
            }
            FileOutcome::Failed {
                kind,
                message,
                diagnostics,
            } => {
                error!(
                    run_id = %self.run_id,
                    stage = %self.stage,
                    file,
                    "Failed: {}: {}",
                    kind,
                    message
                );
                if let Some(diagnostics) = diagnostics {
                    error!(run_id = %self.run_id, stage = %self.stage, file, "{}", diagnostics);
                }
            }
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Create a tracing span for this stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("stage", run_id = %self.run_id, stage = %self.stage)
    }
}
