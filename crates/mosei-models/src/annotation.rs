//! Crowd-sourced annotation rows.

use serde::{Deserialize, Serialize};

use crate::clip::ClipId;

/// Column names shared by the annotation and label tables.
pub mod columns {
    /// Source video identifier in the raw exports.
    pub const VIDEO_ID: &str = "Input.VIDEO_ID";
    /// Clip/segment identifier in the raw exports.
    pub const CLIP: &str = "Input.CLIP";
    /// Raw sentiment judgment in the raw exports.
    pub const SENTIMENT: &str = "Answer.sentiment";
    /// Derived clip identifier / media filename.
    pub const MP4_FILENAME: &str = "mp4_filename";
    /// Average-policy result column.
    pub const AVERAGE_SENTIMENT: &str = "AverageSentiment";
    /// Majority-policy result column.
    pub const FINAL_SENTIMENT: &str = "FinalSentiment";

    /// Columns kept from every raw export.
    pub const RAW_REQUIRED: [&str; 3] = [VIDEO_ID, CLIP, SENTIMENT];

    /// Header of the merged annotation table.
    pub const MERGED: [&str; 4] = [VIDEO_ID, CLIP, SENTIMENT, MP4_FILENAME];
    pub const AVERAGED: [&str; 2] = [MP4_FILENAME, AVERAGE_SENTIMENT];
    pub const MAJORITY: [&str; 2] = [MP4_FILENAME, FINAL_SENTIMENT];
}

/// One worker's judgment for one clip, as stored in the merged table.
///
/// The sentiment stays a raw string here; numeric coercion happens in the
/// resolvers so unparsable values survive the merge untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(rename = "Input.VIDEO_ID")]
    pub video_id: String,
    #[serde(rename = "Input.CLIP")]
    pub clip: String,
    #[serde(rename = "Answer.sentiment")]
    pub sentiment: String,
    #[serde(rename = "mp4_filename")]
    pub mp4_filename: ClipId,
}

impl AnnotationRecord {
    /// Build a record, deriving the clip identifier from the id fields.
    pub fn new(
        video_id: impl Into<String>,
        clip: impl Into<String>,
        sentiment: impl Into<String>,
    ) -> Self {
        let video_id = video_id.into();
        let clip = clip.into();
        let mp4_filename = ClipId::from_parts(&video_id, &clip);
        Self {
            video_id,
            clip,
            sentiment: sentiment.into(),
            mp4_filename,
        }
    }

    /// The judgment coerced to a number, `None` when unparsable.
    pub fn numeric_sentiment(&self) -> Option<f64> {
        self.sentiment
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_derives_clip_id() {
        let record = AnnotationRecord::new("vid", "7", "2");
        assert_eq!(record.mp4_filename.as_str(), "vid_7.mp4");
    }

    #[test]
    fn test_numeric_sentiment_coercion() {
        assert_eq!(AnnotationRecord::new("v", "1", " -1.5 ").numeric_sentiment(), Some(-1.5));
        assert_eq!(AnnotationRecord::new("v", "1", "abc").numeric_sentiment(), None);
        assert_eq!(AnnotationRecord::new("v", "1", "").numeric_sentiment(), None);
        assert_eq!(AnnotationRecord::new("v", "1", "NaN").numeric_sentiment(), None);
    }
}
