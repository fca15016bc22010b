//! Sample table parsing and chunk segmentation.
//!
//! Only the tables needed for manifest timing are decoded:
//! - stts: sample durations (decoding time)
//! - stss: sync sample table (keyframes)
//! - stsz: sample sizes, summed for the bitrate

use super::payload::PayloadReader;
use crate::Result;

/// Default chunk target, in seconds.
pub const DEFAULT_CHUNK_TARGET_SECS: u32 = 2;

/// One `stts` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeToSampleEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// Decoded `stts` box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeToSample {
    pub entries: Vec<TimeToSampleEntry>,
}

impl TimeToSample {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        r.read_full_box_header()?;
        let count = r.read_u32()? as usize;
        let mut entries = Vec::with_capacity(count.min(r.remaining() / 8));
        for _ in 0..count {
            entries.push(TimeToSampleEntry {
                sample_count: r.read_u32()?,
                sample_delta: r.read_u32()?,
            });
        }
        Ok(Self { entries })
    }

    /// Total number of samples.
    pub fn sample_count(&self) -> u64 {
        self.entries.iter().map(|e| e.sample_count as u64).sum()
    }

    /// Sample durations in decode order.
    pub fn deltas(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .iter()
            .flat_map(|e| std::iter::repeat(e.sample_delta).take(e.sample_count as usize))
    }
}

/// Decode an `stss` box into 1-based keyframe sample numbers.
pub fn parse_sync_samples(payload: &[u8]) -> Result<Vec<u32>> {
    let mut r = PayloadReader::new(payload);
    r.read_full_box_header()?;
    let count = r.read_u32()? as usize;
    let mut samples = Vec::with_capacity(count.min(r.remaining() / 4));
    for _ in 0..count {
        samples.push(r.read_u32()?);
    }
    Ok(samples)
}

/// Decode an `stsz` box and return the total size of all samples.
pub fn parse_total_sample_size(payload: &[u8]) -> Result<u64> {
    let mut r = PayloadReader::new(payload);
    r.read_full_box_header()?;
    let sample_size = r.read_u32()?;
    let sample_count = r.read_u32()?;

    if sample_size != 0 {
        return Ok(sample_size as u64 * sample_count as u64);
    }

    let mut total = 0u64;
    for _ in 0..sample_count {
        total += r.read_u32()? as u64;
    }
    Ok(total)
}

/// Splits a sample timeline into manifest chunks of roughly equal length.
///
/// Without keyframes a chunk closes as soon as it grows past the target.
/// With keyframes it closes once it reaches the target and the next sample
/// is a keyframe, so boundaries always land on sync samples.
///
/// ```
/// use ismforge_media::mp4::{ChunkSegmenter, TimeToSample, TimeToSampleEntry};
///
/// let stts = TimeToSample {
///     entries: vec![TimeToSampleEntry { sample_count: 10, sample_delta: 1000 }],
/// };
/// let chunks = ChunkSegmenter::new(1000).build(&stts);
/// assert_eq!(chunks, vec![3000, 3000, 3000, 1000]);
/// ```
#[derive(Debug, Clone)]
pub struct ChunkSegmenter<'a> {
    timescale: u32,
    target_secs: u32,
    keyframes: Option<&'a [u32]>,
}

impl<'a> ChunkSegmenter<'a> {
    /// Create a segmenter for a track with the given media timescale.
    pub fn new(timescale: u32) -> Self {
        Self {
            timescale,
            target_secs: DEFAULT_CHUNK_TARGET_SECS,
            keyframes: None,
        }
    }

    /// Set the chunk target in seconds.
    pub fn target_duration(mut self, secs: u32) -> Self {
        self.target_secs = secs;
        self
    }

    /// Only close chunks on these 1-based sample numbers (ascending).
    pub fn keyframes(mut self, keyframes: &'a [u32]) -> Self {
        self.keyframes = Some(keyframes);
        self
    }

    /// Walk the samples and return chunk durations in media ticks.
    pub fn build(&self, stts: &TimeToSample) -> Vec<u64> {
        let target = self.target_secs as u64 * self.timescale as u64;
        let mut chunks = Vec::new();
        let mut chunk = 0u64;
        let mut next_keyframe = 0usize;
        let mut samples = 0u64;

        for (index, delta) in stts.deltas().enumerate() {
            samples += 1;
            let sample_number = index as u64 + 1;

            let boundary = match self.keyframes {
                Some(keyframes) => {
                    while next_keyframe < keyframes.len()
                        && (keyframes[next_keyframe] as u64) < sample_number
                    {
                        next_keyframe += 1;
                    }
                    let is_keyframe = keyframes
                        .get(next_keyframe)
                        .is_some_and(|&k| k as u64 == sample_number);
                    chunk >= target && is_keyframe
                }
                None => chunk > target,
            };

            if boundary {
                chunks.push(chunk);
                chunk = 0;
            }
            chunk += delta as u64;
        }

        if samples > 0 {
            chunks.push(chunk);
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stts(runs: &[(u32, u32)]) -> TimeToSample {
        TimeToSample {
            entries: runs
                .iter()
                .map(|&(sample_count, sample_delta)| TimeToSampleEntry {
                    sample_count,
                    sample_delta,
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_stts() {
        let mut payload = vec![0; 4];
        for v in [2u32, 5, 1000, 1, 500] {
            payload.extend_from_slice(&v.to_be_bytes());
        }
        let parsed = TimeToSample::parse(&payload).unwrap();
        assert_eq!(parsed, stts(&[(5, 1000), (1, 500)]));
        assert_eq!(parsed.sample_count(), 6);
        assert_eq!(parsed.deltas().sum::<u32>(), 5500);
    }

    #[test]
    fn test_stsz_constant_and_table() {
        let mut constant = vec![0; 4];
        constant.extend_from_slice(&100u32.to_be_bytes());
        constant.extend_from_slice(&7u32.to_be_bytes());
        assert_eq!(parse_total_sample_size(&constant).unwrap(), 700);

        let mut table = vec![0; 4];
        for v in [0u32, 3, 10, 20, 30] {
            table.extend_from_slice(&v.to_be_bytes());
        }
        assert_eq!(parse_total_sample_size(&table).unwrap(), 60);
    }

    #[test]
    fn test_stss() {
        let mut payload = vec![0; 4];
        for v in [3u32, 1, 49, 97] {
            payload.extend_from_slice(&v.to_be_bytes());
        }
        assert_eq!(parse_sync_samples(&payload).unwrap(), vec![1, 49, 97]);
    }

    #[test]
    fn test_audio_closes_past_target() {
        // 1024-tick frames at 48 kHz: the chunk closes once it exceeds 96000
        let chunks = ChunkSegmenter::new(48_000).build(&stts(&[(200, 1024)]));
        assert_eq!(chunks[0], 94 * 1024);
        assert_eq!(chunks.iter().sum::<u64>(), 200 * 1024);
    }

    #[test]
    fn test_exact_target_does_not_close_audio() {
        let chunks = ChunkSegmenter::new(1000).build(&stts(&[(4, 1000)]));
        assert_eq!(chunks, vec![3000, 1000]);
    }

    #[test]
    fn test_video_waits_for_keyframe() {
        // 25 fps, keyframes every 75 samples (3 s): no boundary at 2 s
        let keyframes = [1, 76, 151];
        let chunks = ChunkSegmenter::new(25)
            .keyframes(&keyframes)
            .build(&stts(&[(200, 1)]));
        assert_eq!(chunks, vec![75, 75, 50]);
    }

    #[test]
    fn test_video_closes_at_target_on_keyframe() {
        // Keyframe exactly at 2 s closes the chunk (>= for video)
        let keyframes = [1, 51, 101];
        let chunks = ChunkSegmenter::new(25)
            .keyframes(&keyframes)
            .build(&stts(&[(120, 1)]));
        assert_eq!(chunks, vec![50, 50, 20]);
    }

    #[test]
    fn test_custom_target() {
        let chunks = ChunkSegmenter::new(10)
            .target_duration(4)
            .build(&stts(&[(100, 1)]));
        assert_eq!(chunks, vec![41, 41, 18]);
    }

    #[test]
    fn test_empty_table() {
        assert!(ChunkSegmenter::new(1000).build(&stts(&[])).is_empty());
    }
}
