//! Sample description (`stsd`) entries.

use super::atoms::{BoxType, ChildLayout};
use super::payload::PayloadReader;
use super::tree::BoxNode;
use crate::{Error, Result};

/// Fields read from the first sample entry of an `stsd` box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEntry {
    Visual {
        format: BoxType,
        width: u16,
        height: u16,
    },
    Audio {
        format: BoxType,
        channels: u16,
        bits_per_sample: u16,
        packet_size: u16,
        sample_rate: u32,
    },
    Other {
        format: BoxType,
    },
}

impl SampleEntry {
    /// Decode the fixed fields of a sample entry box.
    pub fn parse(entry: &BoxNode) -> Result<Self> {
        let format = entry.box_type;
        let mut r = PayloadReader::new(&entry.payload);
        r.skip(6)?; // reserved
        r.read_u16()?; // data_reference_index

        match format.layout() {
            ChildLayout::Prefixed(78) => {
                r.skip(16)?; // pre_defined + reserved
                let width = r.read_u16()?;
                let height = r.read_u16()?;
                Ok(Self::Visual {
                    format,
                    width,
                    height,
                })
            }
            ChildLayout::AudioEntry => {
                r.read_u16()?; // version
                r.skip(6)?; // revision + vendor
                let channels = r.read_u16()?;
                let bits_per_sample = r.read_u16()?;
                r.read_u16()?; // compression_id
                let packet_size = r.read_u16()?;
                let sample_rate = r.read_u32()? >> 16;
                Ok(Self::Audio {
                    format,
                    channels,
                    bits_per_sample,
                    packet_size,
                    sample_rate,
                })
            }
            _ => Ok(Self::Other { format }),
        }
    }

    pub fn format(&self) -> BoxType {
        match *self {
            Self::Visual { format, .. } | Self::Audio { format, .. } | Self::Other { format } => {
                format
            }
        }
    }
}

/// First sample entry box of an `stsd`.
pub fn first_entry(stsd: &BoxNode) -> Result<&BoxNode> {
    stsd.children
        .first()
        .ok_or_else(|| Error::malformed("stsd box has no sample entries"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::tree::parse_boxes;
    use crate::testing;
    use bytes::Bytes;

    fn parse_first(data: Vec<u8>) -> BoxNode {
        parse_boxes(Bytes::from(data)).unwrap().remove(0)
    }

    #[test]
    fn test_visual_entry() {
        let stsd = parse_first(testing::stsd(&[testing::avc1(1280, 720, &testing::avcc(&[0x67], &[0x68]))]));
        let entry = first_entry(&stsd).unwrap();
        assert_eq!(
            SampleEntry::parse(entry).unwrap(),
            SampleEntry::Visual {
                format: BoxType::AVC1,
                width: 1280,
                height: 720
            }
        );
        assert!(entry.child(BoxType::AVCC).is_some());
    }

    #[test]
    fn test_audio_entry() {
        let stsd = parse_first(testing::stsd(&[testing::mp4a(2, 16, 44_100, &testing::esds(0x40, 0, &[0x12, 0x10]))]));
        let entry = SampleEntry::parse(first_entry(&stsd).unwrap()).unwrap();
        assert_eq!(
            entry,
            SampleEntry::Audio {
                format: BoxType::MP4A,
                channels: 2,
                bits_per_sample: 16,
                packet_size: 0,
                sample_rate: 44_100
            }
        );
        assert_eq!(entry.format(), BoxType::MP4A);
    }

    #[test]
    fn test_text_entry() {
        let stsd = parse_first(testing::stsd(&[testing::stpp()]));
        let entry = SampleEntry::parse(first_entry(&stsd).unwrap()).unwrap();
        assert_eq!(entry, SampleEntry::Other { format: BoxType::STPP });
    }

    #[test]
    fn test_empty_stsd() {
        let stsd = parse_first(testing::stsd(&[]));
        assert!(first_entry(&stsd).is_err());
    }
}
