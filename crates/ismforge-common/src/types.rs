//! Core type definitions shared by the media parser and the manifest writers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media track.
///
/// The lowercase display form is what both manifests use for stream types
/// and default stream names (`video_0`, `audio_1`, `text_0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    /// Video track.
    Video,
    /// Audio track.
    Audio,
    /// Text (subtitle) track.
    Text,
}

impl TrackType {
    /// Lowercase name of the track type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_type_display() {
        assert_eq!(TrackType::Video.to_string(), "video");
        assert_eq!(TrackType::Audio.to_string(), "audio");
        assert_eq!(TrackType::Text.to_string(), "text");
    }

    #[test]
    fn test_track_type_serialization() {
        let json = serde_json::to_string(&TrackType::Audio).unwrap();
        assert_eq!(json, "\"audio\"");

        let parsed: TrackType = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(parsed, TrackType::Text);
    }
}
