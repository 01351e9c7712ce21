//! Clip identifier model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File extension appended to every clip identifier.
pub const MEDIA_EXTENSION: &str = "mp4";

/// Identifier of one video segment, e.g. `"-3g5yACwYnA_4.mp4"`.
///
/// The identifier doubles as the media filename, so the same value joins
/// annotation rows to the videos on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Derive the identifier from a source video id and a clip/segment id.
    pub fn from_parts(video_id: &str, clip: &str) -> Self {
        Self(format!("{}_{}.{}", video_id, clip, MEDIA_EXTENSION))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ClipId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
