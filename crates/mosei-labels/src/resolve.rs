//! Per-clip sentiment label resolution.
//!
//! Two policies reduce the judgments of one clip to a single label:
//!
//! - **average**: mean of the numeric judgments.
//! - **majority**: the most frequent value when it is unique; when two or
//!   more values share the highest tally, the mean of the *whole* group
//!   (not only the tied values) rounded to two decimals.
//!
//! Non-numeric judgments are excluded before either policy runs. A clip with
//! no numeric judgments resolves to `None` and is logged as an anomaly.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use mosei_models::{AnnotationRecord, AverageLabel, ClipId, MajorityLabel, ResolutionKind};

/// Arithmetic mean, `None` for an empty group.
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round to two decimals. Ties go to the even digit and are judged on the
/// exact binary value, so `2.675` (stored just below the half) becomes `2.67`.
pub fn round2(value: f64) -> f64 {
    // Fixed-precision formatting rounds the exact expansion half-to-even
    let rounded = format!("{:.2}", value).parse::<f64>().unwrap_or(value);
    // Adding 0.0 turns -0.0 into 0.0
    rounded + 0.0
}

/// Majority vote with whole-group mean on ties.
///
/// Returns `None` for an empty group.
pub fn majority(values: &[f64]) -> Option<(f64, ResolutionKind)> {
    // Tally in first-seen order; groups are a handful of judgments
    let mut tally: Vec<(f64, usize)> = Vec::new();
    for &v in values {
        match tally.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, count)) => *count += 1,
            None => tally.push((v, 1)),
        }
    }

    let max_count = tally.iter().map(|(_, count)| *count).max()?;
    let mut candidates = tally.iter().filter(|(_, count)| *count == max_count);

    match (candidates.next(), candidates.next()) {
        (Some(&(winner, _)), None) => Some((winner, ResolutionKind::ClearWinner)),
        _ => average(values).map(|mean| (round2(mean), ResolutionKind::TieBreak)),
    }
}

/// Group numeric judgments by clip, in clip order.
///
/// Clips whose judgments are all unparsable still get an (empty) entry.
pub fn group_by_clip(records: &[AnnotationRecord]) -> BTreeMap<ClipId, Vec<f64>> {
    let mut groups: BTreeMap<ClipId, Vec<f64>> = BTreeMap::new();
    for record in records {
        let group = groups.entry(record.mp4_filename.clone()).or_default();
        if let Some(v) = record.numeric_sentiment() {
            group.push(v);
        }
    }
    groups
}

/// Apply the average policy to every clip.
pub fn resolve_average(records: &[AnnotationRecord]) -> Vec<AverageLabel> {
    group_by_clip(records)
        .into_iter()
        .map(|(clip, values)| {
            let average_sentiment = average(&values);
            if average_sentiment.is_none() {
                warn!(clip = %clip, "No numeric judgments, average left empty");
            }
            AverageLabel {
                mp4_filename: clip,
                average_sentiment,
            }
        })
        .collect()
}

/// Counts of how majority labels were reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub clear_winner: usize,
    pub tie_break: usize,
    pub no_valid_values: usize,
}

impl ResolutionStats {
    fn record(&mut self, kind: ResolutionKind) {
        match kind {
            ResolutionKind::ClearWinner => self.clear_winner += 1,
            ResolutionKind::TieBreak => self.tie_break += 1,
            ResolutionKind::NoValidValues => self.no_valid_values += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.clear_winner + self.tie_break + self.no_valid_values
    }
}

/// Apply the majority policy to every clip.
pub fn resolve_majority(records: &[AnnotationRecord]) -> (Vec<MajorityLabel>, ResolutionStats) {
    let mut stats = ResolutionStats::default();

    let labels = group_by_clip(records)
        .into_iter()
        .map(|(clip, values)| {
            let (final_sentiment, kind) = match majority(&values) {
                Some((value, kind)) => (Some(value), kind),
                None => {
                    warn!(clip = %clip, "No numeric judgments, majority label left empty");
                    (None, ResolutionKind::NoValidValues)
                }
            };
            debug!(clip = %clip, %kind, "Majority label resolved");
            stats.record(kind);
            MajorityLabel {
                mp4_filename: clip,
                final_sentiment,
            }
        })
        .collect();

    (labels, stats)
}
