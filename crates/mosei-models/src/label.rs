//! Resolved sentiment label rows.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clip::ClipId;

/// Average-policy result for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageLabel {
    #[serde(rename = "mp4_filename")]
    pub mp4_filename: ClipId,
    /// Mean of the numeric judgments, `None` when the clip had none.
    #[serde(rename = "AverageSentiment")]
    pub average_sentiment: Option<f64>,
}

/// Majority-policy result for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorityLabel {
    #[serde(rename = "mp4_filename")]
    pub mp4_filename: ClipId,
    #[serde(rename = "FinalSentiment")]
    pub final_sentiment: Option<f64>,
}

/// How a majority-policy label was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// One value had the highest tally.
    ClearWinner,
    /// Two or more values shared the highest tally; the group mean was used.
    TieBreak,
    /// The group had no numeric judgments.
    NoValidValues,
}

impl ResolutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionKind::ClearWinner => "clear_winner",
            ResolutionKind::TieBreak => "tie_break",
            ResolutionKind::NoValidValues => "no_valid_values",
        }
    }
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
