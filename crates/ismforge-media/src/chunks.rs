//! Manifest chunk lists.
//!
//! Client manifests describe every fragment as a `c` element on a fixed
//! 10 MHz clock. Track durations live in each track's media timescale, so
//! converting chunk by chunk accumulates rounding error. Instead each chunk
//! boundary is placed at the rounded exact cumulative time and the chunk
//! duration is the difference between consecutive boundaries. Every chunk is
//! then within one tick of its exact length and the list sums to the rounded
//! track duration.
//!
//! Consecutive equal durations are run-length compressed into one entry with
//! a repeat count.

use crate::track::{ChunkList, MediaDuration};
use std::time::Duration;

/// Clock rate of client manifest timestamps (100 ns ticks).
pub const MANIFEST_TIMESCALE: u64 = 10_000_000;

/// One run of equal-length chunks (`<c t=".." d=".." r=".."/>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ChunkEntry {
    /// Start time, only set on the first entry of a stream.
    pub time_start: Option<u64>,
    pub duration: u64,
    pub repeat: u32,
}

impl ChunkEntry {
    fn run(duration: u64) -> Self {
        Self {
            time_start: None,
            duration,
            repeat: 1,
        }
    }
}

/// Build the compressed chunk entries of a track.
///
/// # Examples
///
/// ```
/// use ismforge_media::chunks::generate_chunk_entries;
/// use ismforge_media::track::ChunkList;
///
/// // three 1001/30000 s frames
/// let entries = generate_chunk_entries(&ChunkList::new(30_000, vec![1001, 1001, 1001]));
/// let ticks: Vec<_> = entries.iter().map(|e| (e.duration, e.repeat)).collect();
/// assert_eq!(ticks, vec![(333_667, 1), (333_666, 1), (333_667, 1)]);
/// assert_eq!(entries[0].time_start, Some(0));
/// ```
pub fn generate_chunk_entries(chunks: &ChunkList) -> Vec<ChunkEntry> {
    if chunks.timescale == 0 {
        return Vec::new();
    }

    let timescale = chunks.timescale as u128;
    let mut exact = 0u128;
    let mut emitted = 0u128;
    let mut durations = Vec::with_capacity(chunks.len());

    for &ticks in &chunks.durations {
        exact += ticks as u128 * MANIFEST_TIMESCALE as u128;
        let boundary = round_half_even(exact, timescale);
        durations.push(saturate(boundary - emitted));
        emitted = boundary;
    }

    compress_durations(&durations)
}

/// Run-length compress manifest chunk durations.
pub fn compress_durations(durations: &[u64]) -> Vec<ChunkEntry> {
    let mut entries: Vec<ChunkEntry> = Vec::new();
    for &duration in durations {
        match entries.last_mut() {
            Some(last) if last.duration == duration => last.repeat += 1,
            _ => entries.push(ChunkEntry::run(duration)),
        }
    }
    if let Some(first) = entries.first_mut() {
        first.time_start = Some(0);
    }
    entries
}

/// Expand entries back into one duration per chunk.
pub fn expand_chunk_entries(entries: &[ChunkEntry]) -> Vec<u64> {
    entries
        .iter()
        .flat_map(|e| std::iter::repeat(e.duration).take(e.repeat as usize))
        .collect()
}

/// Single chunk of a standalone subtitle file.
pub fn subtitle_chunk_entry(start: Duration, duration: Duration) -> ChunkEntry {
    ChunkEntry {
        time_start: Some(duration_ticks(start)),
        duration: duration_ticks(duration),
        repeat: 1,
    }
}

/// Asset duration in manifest ticks.
pub fn asset_duration_ticks(duration: MediaDuration) -> u64 {
    if duration.timescale == 0 {
        return 0;
    }
    saturate(round_half_even(
        duration.value as u128 * MANIFEST_TIMESCALE as u128,
        duration.timescale as u128,
    ))
}

fn duration_ticks(d: Duration) -> u64 {
    saturate(round_half_even(d.as_nanos(), 100))
}

fn round_half_even(numerator: u128, denominator: u128) -> u128 {
    let quotient = numerator / denominator;
    let twice_remainder = (numerator % denominator) * 2;
    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

fn saturate(value: u128) -> u64 {
    value.min(u64::MAX as u128) as u64
}
