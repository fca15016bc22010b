//! Movie, track and fragment header boxes.

use super::atoms::HandlerType;
use super::payload::PayloadReader;
use crate::Result;
use ismforge_common::language::UNDETERMINED;

/// `mvhd`: movie timescale and duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieHeader {
    pub timescale: u32,
    pub duration: u64,
}

impl MovieHeader {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let (version, _) = r.read_full_box_header()?;
        r.read_versioned(version)?; // creation_time
        r.read_versioned(version)?; // modification_time
        let timescale = r.read_u32()?;
        let duration = r.read_versioned(version)?;
        Ok(Self {
            timescale,
            duration,
        })
    }
}

/// `mehd`: overall duration of a fragmented movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieExtendsHeader {
    pub fragment_duration: u64,
}

impl MovieExtendsHeader {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let (version, _) = r.read_full_box_header()?;
        Ok(Self {
            fragment_duration: r.read_versioned(version)?,
        })
    }
}

/// `tkhd`: only the track ID is of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackHeader {
    pub track_id: u32,
}

impl TrackHeader {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let (version, _) = r.read_full_box_header()?;
        r.read_versioned(version)?;
        r.read_versioned(version)?;
        Ok(Self {
            track_id: r.read_u32()?,
        })
    }
}

/// `mdhd`: media timescale, duration and language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHeader {
    pub timescale: u32,
    pub duration: u64,
    /// ISO 639-2/T code, `und` when unset or not decodable.
    pub language: String,
}

impl MediaHeader {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let (version, _) = r.read_full_box_header()?;
        r.read_versioned(version)?;
        r.read_versioned(version)?;
        let timescale = r.read_u32()?;
        let duration = r.read_versioned(version)?;
        let language = decode_language(r.read_u16()?);
        Ok(Self {
            timescale,
            duration,
            language,
        })
    }
}

/// Unpack three 5-bit letters (each stored minus 0x60).
fn decode_language(packed: u16) -> String {
    let letters = [(packed >> 10) & 0x1F, (packed >> 5) & 0x1F, packed & 0x1F];
    if letters.iter().any(|&l| l == 0 || l > 26) {
        return UNDETERMINED.to_string();
    }
    letters.iter().map(|&l| (l as u8 + 0x60) as char).collect()
}

/// Read the handler type out of an `hdlr` payload.
pub fn parse_handler(payload: &[u8]) -> Result<HandlerType> {
    let mut r = PayloadReader::new(payload);
    r.read_full_box_header()?;
    r.read_u32()?; // pre_defined
    let handler = r.read_slice(4)?;
    Ok(HandlerType::from_bytes([
        handler[0], handler[1], handler[2], handler[3],
    ]))
}

/// `trex`: per-track defaults for movie fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackExtends {
    pub track_id: u32,
    pub default_sample_duration: u32,
    pub default_sample_size: u32,
}

impl TrackExtends {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        r.read_full_box_header()?;
        let track_id = r.read_u32()?;
        r.read_u32()?; // default_sample_description_index
        let default_sample_duration = r.read_u32()?;
        let default_sample_size = r.read_u32()?;
        Ok(Self {
            track_id,
            default_sample_duration,
            default_sample_size,
        })
    }
}

/// `tfhd`: track fragment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackFragmentHeader {
    pub track_id: u32,
    pub base_data_offset: Option<u64>,
    pub sample_description_index: Option<u32>,
    pub default_sample_duration: Option<u32>,
    pub default_sample_size: Option<u32>,
    pub default_sample_flags: Option<u32>,
}

impl TrackFragmentHeader {
    pub const BASE_DATA_OFFSET: u32 = 0x01;
    pub const SAMPLE_DESCRIPTION_INDEX: u32 = 0x02;
    pub const DEFAULT_SAMPLE_DURATION: u32 = 0x08;
    pub const DEFAULT_SAMPLE_SIZE: u32 = 0x10;
    pub const DEFAULT_SAMPLE_FLAGS: u32 = 0x20;

    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let (_, flags) = r.read_full_box_header()?;
        let track_id = r.read_u32()?;

        let base_data_offset = optional(flags & Self::BASE_DATA_OFFSET != 0, || r.read_u64())?;
        let sample_description_index =
            optional(flags & Self::SAMPLE_DESCRIPTION_INDEX != 0, || r.read_u32())?;
        let default_sample_duration =
            optional(flags & Self::DEFAULT_SAMPLE_DURATION != 0, || r.read_u32())?;
        let default_sample_size = optional(flags & Self::DEFAULT_SAMPLE_SIZE != 0, || r.read_u32())?;
        let default_sample_flags =
            optional(flags & Self::DEFAULT_SAMPLE_FLAGS != 0, || r.read_u32())?;

        Ok(Self {
            track_id,
            base_data_offset,
            sample_description_index,
            default_sample_duration,
            default_sample_size,
            default_sample_flags,
        })
    }
}

/// One `trun` sample; absent fields were not signalled by the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrunSample {
    pub duration: Option<u32>,
    pub size: Option<u32>,
    pub flags: Option<u32>,
    pub composition_offset: Option<u32>,
}

/// `trun`: track fragment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRun {
    pub sample_count: u32,
    pub data_offset: Option<i32>,
    pub first_sample_flags: Option<u32>,
    pub samples: Vec<TrunSample>,
}

impl TrackRun {
    pub const DATA_OFFSET: u32 = 0x001;
    pub const FIRST_SAMPLE_FLAGS: u32 = 0x004;
    pub const SAMPLE_DURATION: u32 = 0x100;
    pub const SAMPLE_SIZE: u32 = 0x200;
    pub const SAMPLE_FLAGS: u32 = 0x400;
    pub const SAMPLE_COMPOSITION_OFFSET: u32 = 0x800;

    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let (_, flags) = r.read_full_box_header()?;
        let sample_count = r.read_u32()?;
        let data_offset = optional(flags & Self::DATA_OFFSET != 0, || {
            r.read_u32().map(|v| v as i32)
        })?;
        let first_sample_flags = optional(flags & Self::FIRST_SAMPLE_FLAGS != 0, || r.read_u32())?;

        // Guard the allocation against a bogus count
        let per_sample = [
            Self::SAMPLE_DURATION,
            Self::SAMPLE_SIZE,
            Self::SAMPLE_FLAGS,
            Self::SAMPLE_COMPOSITION_OFFSET,
        ]
        .iter()
        .filter(|&&f| flags & f != 0)
        .count()
            * 4;
        let capacity = if per_sample == 0 {
            0
        } else {
            (sample_count as usize).min(r.remaining() / per_sample)
        };

        let mut samples = Vec::with_capacity(capacity);
        if per_sample > 0 {
            for _ in 0..sample_count {
                samples.push(TrunSample {
                    duration: optional(flags & Self::SAMPLE_DURATION != 0, || r.read_u32())?,
                    size: optional(flags & Self::SAMPLE_SIZE != 0, || r.read_u32())?,
                    flags: optional(flags & Self::SAMPLE_FLAGS != 0, || r.read_u32())?,
                    composition_offset: optional(
                        flags & Self::SAMPLE_COMPOSITION_OFFSET != 0,
                        || r.read_u32(),
                    )?,
                });
            }
        }

        Ok(Self {
            sample_count,
            data_offset,
            first_sample_flags,
            samples,
        })
    }

    /// Sum of explicit sample durations.
    pub fn total_duration(&self) -> u64 {
        self.samples
            .iter()
            .filter_map(|s| s.duration)
            .map(u64::from)
            .sum()
    }

    /// Sum of explicit sample sizes.
    pub fn total_size(&self) -> u64 {
        self.samples.iter().filter_map(|s| s.size).map(u64::from).sum()
    }
}

fn optional<T>(present: bool, read: impl FnOnce() -> Result<T>) -> Result<Option<T>> {
    if present {
        read().map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use assert_matches::assert_matches;

    #[test]
    fn test_mvhd_versions() {
        let mut v0 = vec![0, 0, 0, 0];
        v0.extend_from_slice(&[0; 8]);
        v0.extend_from_slice(&1000u32.to_be_bytes());
        v0.extend_from_slice(&60_000u32.to_be_bytes());
        assert_eq!(
            MovieHeader::parse(&v0).unwrap(),
            MovieHeader {
                timescale: 1000,
                duration: 60_000
            }
        );

        let mut v1 = vec![1, 0, 0, 0];
        v1.extend_from_slice(&[0; 16]);
        v1.extend_from_slice(&90_000u32.to_be_bytes());
        v1.extend_from_slice(&(u32::MAX as u64 + 5).to_be_bytes());
        let header = MovieHeader::parse(&v1).unwrap();
        assert_eq!(header.timescale, 90_000);
        assert_eq!(header.duration, u32::MAX as u64 + 5);
    }

    #[test]
    fn test_mdhd_language() {
        let mut payload = vec![0, 0, 0, 0];
        payload.extend_from_slice(&[0; 8]);
        payload.extend_from_slice(&48_000u32.to_be_bytes());
        payload.extend_from_slice(&96_000u32.to_be_bytes());
        // "ger": g=7, e=5, r=18
        let packed: u16 = (7 << 10) | (5 << 5) | 18;
        payload.extend_from_slice(&packed.to_be_bytes());

        let mdhd = MediaHeader::parse(&payload).unwrap();
        assert_eq!(mdhd.timescale, 48_000);
        assert_eq!(mdhd.language, "ger");
    }

    #[test]
    fn test_language_zero_is_undetermined() {
        assert_eq!(decode_language(0), "und");
        assert_eq!(decode_language((31 << 10) | (1 << 5) | 1), "und");
    }

    #[test]
    fn test_hdlr() {
        let mut payload = vec![0; 8];
        payload.extend_from_slice(b"soun");
        payload.extend_from_slice(&[0; 12]);
        assert_eq!(parse_handler(&payload).unwrap(), HandlerType::Audio);
    }

    #[test]
    fn test_tfhd_optional_fields() {
        let flags = TrackFragmentHeader::DEFAULT_SAMPLE_DURATION | TrackFragmentHeader::DEFAULT_SAMPLE_FLAGS;
        let mut payload = flags.to_be_bytes().to_vec();
        payload.extend_from_slice(&2u32.to_be_bytes());
        payload.extend_from_slice(&1024u32.to_be_bytes());
        payload.extend_from_slice(&0x0101_0000u32.to_be_bytes());

        let tfhd = TrackFragmentHeader::parse(&payload).unwrap();
        assert_eq!(tfhd.track_id, 2);
        assert_eq!(tfhd.default_sample_duration, Some(1024));
        assert_eq!(tfhd.default_sample_size, None);
        assert_eq!(tfhd.default_sample_flags, Some(0x0101_0000));
        assert_eq!(tfhd.base_data_offset, None);
    }

    #[test]
    fn test_trun_samples() {
        let flags = TrackRun::DATA_OFFSET | TrackRun::SAMPLE_DURATION | TrackRun::SAMPLE_SIZE;
        let mut payload = flags.to_be_bytes().to_vec();
        payload.extend_from_slice(&2u32.to_be_bytes());
        payload.extend_from_slice(&(-8i32).to_be_bytes());
        for (d, s) in [(1000u32, 300u32), (1001, 200)] {
            payload.extend_from_slice(&d.to_be_bytes());
            payload.extend_from_slice(&s.to_be_bytes());
        }

        let trun = TrackRun::parse(&payload).unwrap();
        assert_eq!(trun.sample_count, 2);
        assert_eq!(trun.data_offset, Some(-8));
        assert_eq!(trun.total_duration(), 2001);
        assert_eq!(trun.total_size(), 500);
    }

    #[test]
    fn test_trun_truncated() {
        let flags = TrackRun::SAMPLE_SIZE;
        let mut payload = flags.to_be_bytes().to_vec();
        payload.extend_from_slice(&3u32.to_be_bytes());
        payload.extend_from_slice(&10u32.to_be_bytes());
        assert_matches!(TrackRun::parse(&payload), Err(Error::BufferUnderflow { .. }));
    }

    #[test]
    fn test_trex() {
        let mut payload = vec![0; 4];
        for v in [3u32, 1, 512, 0, 0] {
            payload.extend_from_slice(&v.to_be_bytes());
        }
        let trex = TrackExtends::parse(&payload).unwrap();
        assert_eq!(trex.track_id, 3);
        assert_eq!(trex.default_sample_duration, 512);
        assert_eq!(trex.default_sample_size, 0);
    }
}
