//! Track records and exact timing values.
//!
//! Chunk durations are kept in the track's own media timescale so the
//! manifest generator can rescale them without floating point drift.

mod extractor;

pub use extractor::{extract_media, MediaInfo};

use ismforge_common::TrackType;
use std::cmp::Ordering;

/// Chunk durations of one track, in media ticks.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ChunkList {
    pub timescale: u32,
    pub durations: Vec<u64>,
}

impl ChunkList {
    pub fn new(timescale: u32, durations: Vec<u64>) -> Self {
        Self {
            timescale,
            durations,
        }
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Sum of all chunk durations, in media ticks.
    pub fn total_ticks(&self) -> u64 {
        self.durations.iter().sum()
    }

    /// Total duration as an exact value.
    pub fn total(&self) -> MediaDuration {
        MediaDuration::new(self.total_ticks(), self.timescale)
    }

    /// Chunk durations in seconds.
    pub fn seconds(&self) -> Vec<f64> {
        if self.timescale == 0 {
            return vec![0.0; self.durations.len()];
        }
        self.durations
            .iter()
            .map(|&d| d as f64 / self.timescale as f64)
            .collect()
    }
}

/// Lists are equal when every chunk has the same length in seconds.
impl PartialEq for ChunkList {
    fn eq(&self, other: &Self) -> bool {
        self.durations.len() == other.durations.len()
            && self
                .durations
                .iter()
                .zip(&other.durations)
                .all(|(&a, &b)| a as u128 * other.timescale as u128 == b as u128 * self.timescale as u128)
    }
}

impl Eq for ChunkList {}

/// Exact duration as ticks over a timescale.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct MediaDuration {
    pub value: u64,
    pub timescale: u32,
}

impl MediaDuration {
    pub fn new(value: u64, timescale: u32) -> Self {
        Self { value, timescale }
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0 || self.timescale == 0
    }

    pub fn seconds(&self) -> f64 {
        if self.timescale == 0 {
            0.0
        } else {
            self.value as f64 / self.timescale as f64
        }
    }

    /// `floor(bytes * 8 / duration)`, 0 for an empty duration.
    pub fn bit_rate(&self, bytes: u64) -> u64 {
        if self.is_zero() {
            return 0;
        }
        let bits = bytes as u128 * 8 * self.timescale as u128;
        (bits / self.value as u128).min(u64::MAX as u128) as u64
    }

    // A zero timescale counts as zero length
    fn numerator(&self, other: &Self) -> u128 {
        if self.timescale == 0 {
            0
        } else {
            self.value as u128 * other.timescale.max(1) as u128
        }
    }
}

impl PartialEq for MediaDuration {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MediaDuration {}

impl PartialOrd for MediaDuration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaDuration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numerator(other).cmp(&other.numerator(self))
    }
}

/// Everything the manifests need to know about one track.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct TrackRecord {
    pub track_id: u32,
    pub track_type: TrackType,
    pub four_cc: String,
    pub bit_rate: u64,
    /// Uppercase hex.
    pub codec_private_data: String,
    pub chunks: ChunkList,
    pub source_blob_name: String,
    /// Index file that supplied refined chunks and bitrate.
    pub index_blob_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub channels: Option<u32>,
    pub sampling_rate: Option<u32>,
    pub bits_per_sample: Option<u32>,
    pub packet_size: Option<u32>,
    pub audio_tag: Option<u32>,
    /// ISO 639-2/T code.
    pub language: Option<String>,
    /// Display name for the stream index.
    pub track_name: Option<String>,
}

impl TrackRecord {
    pub fn new(track_id: u32, track_type: TrackType, source_blob_name: impl Into<String>) -> Self {
        Self {
            track_id,
            track_type,
            four_cc: String::new(),
            bit_rate: 0,
            codec_private_data: String::new(),
            chunks: ChunkList::default(),
            source_blob_name: source_blob_name.into(),
            index_blob_name: None,
            width: None,
            height: None,
            channels: None,
            sampling_rate: None,
            bits_per_sample: None,
            packet_size: None,
            audio_tag: None,
            language: None,
            track_name: None,
        }
    }

    /// Set membership identity: the track ID alone.
    pub fn same_track(&self, other: &Self) -> bool {
        self.track_id == other.track_id
    }

    /// Same language as `other` (both unset counts as equal).
    pub fn same_language(&self, other: &Self) -> bool {
        self.language == other.language
    }

    /// File the manifests reference for this track.
    pub fn manifest_source(&self) -> &str {
        self.index_blob_name
            .as_deref()
            .unwrap_or(&self.source_blob_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_list_rational_equality() {
        let a = ChunkList::new(1000, vec![2000, 2000, 1500]);
        let b = ChunkList::new(90_000, vec![180_000, 180_000, 135_000]);
        let c = ChunkList::new(90_000, vec![180_000, 180_000, 135_001]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, ChunkList::new(1000, vec![2000, 2000]));
    }

    #[test]
    fn test_chunk_list_seconds() {
        let list = ChunkList::new(48_000, vec![96_000, 24_000]);
        assert_eq!(list.seconds(), vec![2.0, 0.5]);
        assert_eq!(list.total(), MediaDuration::new(5, 2));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_media_duration_ordering() {
        assert!(MediaDuration::new(3, 1) > MediaDuration::new(2999, 1000));
        assert_eq!(MediaDuration::new(3, 1), MediaDuration::new(3000, 1000));
        assert!(MediaDuration::default() < MediaDuration::new(1, 90_000));
        assert_eq!(MediaDuration::new(5, 0), MediaDuration::default());
    }

    #[test]
    fn test_bit_rate() {
        // 1_000_000 bytes over 8 seconds
        assert_eq!(MediaDuration::new(8000, 1000).bit_rate(1_000_000), 1_000_000);
        // floor, not round
        assert_eq!(MediaDuration::new(3, 1).bit_rate(100), 266);
        assert_eq!(MediaDuration::default().bit_rate(100), 0);
    }

    #[test]
    fn test_same_track_ignores_other_fields() {
        let mut a = TrackRecord::new(2, TrackType::Audio, "a.mp4");
        let b = TrackRecord::new(2, TrackType::Audio, "b.mp4");
        a.bit_rate = 64_000;
        assert!(a.same_track(&b));
        assert_ne!(a, b);
        assert_eq!(b.manifest_source(), "b.mp4");
    }
}
