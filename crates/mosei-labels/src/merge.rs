//! Annotation merging.
//!
//! Raw exports are reduced to the id and judgment columns, tagged with their
//! clip identifier and filtered to clips whose media exists. Rows from all
//! exports are concatenated as-is; duplicates across exports are kept.

use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{error, info};

use mosei_models::AnnotationRecord;

use crate::table::read_raw_annotations;

/// Totals for one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub tables_merged: usize,
    /// Exports that could not be read, with the reason.
    pub tables_skipped: Vec<(PathBuf, String)>,
    pub rows_read: usize,
    pub rows_kept: usize,
}

/// Keep only records whose clip identifier is in `media`.
pub fn filter_to_media(
    records: Vec<AnnotationRecord>,
    media: &BTreeSet<String>,
) -> Vec<AnnotationRecord> {
    records
        .into_iter()
        .filter(|r| media.contains(r.mp4_filename.as_str()))
        .collect()
}

/// Read, filter and concatenate every export in `paths`, in order.
///
/// An export that cannot be read or lacks a required column is logged and
/// skipped; the others are still merged.
pub fn merge_annotations(
    paths: &[PathBuf],
    media: &BTreeSet<String>,
) -> (Vec<AnnotationRecord>, MergeSummary) {
    let mut summary = MergeSummary::default();
    let mut merged = Vec::new();

    for path in paths {
        let records = match read_raw_annotations(path) {
            Ok(records) => records,
            Err(e) => {
                error!(table = %path.display(), "Skipping annotation table: {}", e);
                summary.tables_skipped.push((path.clone(), e.to_string()));
                continue;
            }
        };

        let read = records.len();
        let kept = filter_to_media(records, media);
        info!(
            table = %path.display(),
            rows = read,
            kept = kept.len(),
            "Filtered annotation table"
        );

        summary.tables_merged += 1;
        summary.rows_read += read;
        summary.rows_kept += kept.len();
        merged.extend(kept);
    }

    (merged, summary)
}
