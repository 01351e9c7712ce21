//! Annotation merge and label resolution stages.

use mosei_labels::{
    merge_annotations, read_merged_annotations, resolve_average, resolve_majority, write_table,
    MergeSummary, ResolutionStats,
};
use mosei_media::list_file_names;
use mosei_models::columns;

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::logging::StageLogger;
use crate::report::RunOptions;

/// Merge the raw annotation exports into one table, keeping only clips whose
/// media is present in the merge media directory.
pub async fn run_merge(
    config: &PipelineConfig,
    logger: &StageLogger,
    options: &RunOptions,
) -> PipelineResult<MergeSummary> {
    let paths = &config.paths;
    logger.log_start(&format!(
        "{} raw tables against {}",
        paths.raw_annotations.len(),
        paths.merge_media_dir.display()
    ));

    let media = list_file_names(&paths.merge_media_dir).await?;
    if media.is_empty() {
        logger.log_warning(&format!(
            "No media found in {}; merged table will be empty",
            paths.merge_media_dir.display()
        ));
    }

    let (merged, summary) = merge_annotations(&paths.raw_annotations, &media);

    if options.dry_run {
        logger.log_progress(&format!(
            "[dry-run] Would write {} rows to {}",
            merged.len(),
            paths.merged_csv.display()
        ));
    } else {
        write_table(&paths.merged_csv, &columns::MERGED, &merged)?;
    }

    logger.log_completion(&format!(
        "{} tables merged, {} skipped, {} of {} rows kept",
        summary.tables_merged,
        summary.tables_skipped.len(),
        summary.rows_kept,
        summary.rows_read
    ));
    Ok(summary)
}

/// Write the per-clip mean of the merged judgments. Returns the number of
/// clips labelled.
pub async fn run_average(
    config: &PipelineConfig,
    logger: &StageLogger,
    options: &RunOptions,
) -> PipelineResult<usize> {
    let paths = &config.paths;
    logger.log_start(&paths.merged_csv.display().to_string());

    let records = read_merged_annotations(&paths.merged_csv)?;
    let labels = resolve_average(&records);
    let missing = labels
        .iter()
        .filter(|l| l.average_sentiment.is_none())
        .count();

    if options.dry_run {
        logger.log_progress(&format!(
            "[dry-run] Would write {} labels to {}",
            labels.len(),
            paths.averaged_csv.display()
        ));
    } else {
        write_table(&paths.averaged_csv, &columns::AVERAGED, &labels)?;
    }

    logger.log_completion(&format!(
        "{} clips from {} judgments, {} without a numeric judgment",
        labels.len(),
        records.len(),
        missing
    ));
    Ok(labels.len())
}

/// Write the per-clip majority vote of the merged judgments.
pub async fn run_majority(
    config: &PipelineConfig,
    logger: &StageLogger,
    options: &RunOptions,
) -> PipelineResult<ResolutionStats> {
    let paths = &config.paths;
    logger.log_start(&paths.merged_csv.display().to_string());

    let records = read_merged_annotations(&paths.merged_csv)?;
    let (labels, stats) = resolve_majority(&records);

    if options.dry_run {
        logger.log_progress(&format!(
            "[dry-run] Would write {} labels to {}",
            labels.len(),
            paths.majority_csv.display()
        ));
    } else {
        write_table(&paths.majority_csv, &columns::MAJORITY, &labels)?;
    }

    logger.log_completion(&format!(
        "{} clips: {} clear winners, {} tie-breaks, {} without a numeric judgment",
        stats.total(),
        stats.clear_winner,
        stats.tie_break,
        stats.no_valid_values
    ));
    Ok(stats)
}
