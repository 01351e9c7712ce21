//! Annotation merging and sentiment label resolution.
//!
//! This crate provides:
//! - CSV readers/writers for the raw exports, merged table and label tables
//! - The annotation merger (column selection, clip ids, media filtering)
//! - The average and majority-vote label resolvers

pub mod error;
pub mod merge;
pub mod resolve;
pub mod table;

pub use error::{LabelError, LabelResult};
pub use merge::{filter_to_media, merge_annotations, MergeSummary};
pub use resolve::{
    average, group_by_clip, majority, resolve_average, resolve_majority, round2, ResolutionStats,
};
pub use table::{read_manifest, read_merged_annotations, read_raw_annotations, write_table};
