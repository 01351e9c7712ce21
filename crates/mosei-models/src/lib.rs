//! Shared data models for the MOSEI preprocessing pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Clip identifiers (the join key between annotation tables and media files)
//! - Annotation and resolved-label table rows
//! - Encoding settings for the downsample and face-video stages

pub mod annotation;
pub mod clip;
pub mod encoding;
pub mod label;

// Re-export common types
pub use annotation::{columns, AnnotationRecord};
pub use clip::{ClipId, MEDIA_EXTENSION};
pub use encoding::{resolve_output_fps, DownsampleEncoding, FaceVideoEncoding};
pub use label::{AverageLabel, MajorityLabel, ResolutionKind};
