//! Audio codec dispatch.

use super::aac::EsDescriptor;
use super::eac3::Eac3Config;
use crate::mp4::{BoxNode, BoxType, SampleEntry};
use crate::{Error, Result};

/// `AudioTag` for AAC (0xFF, unspecified).
pub const AUDIO_TAG_AAC: u32 = 255;
/// `AudioTag` for E-AC-3 (WAVE_FORMAT_EXTENSIBLE).
pub const AUDIO_TAG_EAC3: u32 = 65534;

/// Manifest fields of an audio track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrackData {
    pub four_cc: String,
    pub codec_private_data: String,
    pub bit_rate: u64,
    pub channels: u32,
    pub sampling_rate: u32,
    pub bits_per_sample: u32,
    pub packet_size: u32,
    pub audio_tag: u32,
}

/// Closed set of supported audio codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCodec {
    Aac(EsDescriptor),
    Eac3(Eac3Config),
}

impl AudioCodec {
    /// Read the codec configuration box of an audio sample entry.
    pub fn from_entry(entry: &BoxNode) -> Result<Self> {
        match entry.box_type {
            BoxType::MP4A => {
                let esds = entry
                    .child(BoxType::ESDS)
                    .ok_or(Error::MissingRequiredBox("esds"))?;
                Ok(Self::Aac(EsDescriptor::parse(&esds.payload)?))
            }
            BoxType::EC3 => {
                let dec3 = entry
                    .child(BoxType::DEC3)
                    .ok_or(Error::MissingRequiredBox("dec3"))?;
                Ok(Self::Eac3(Eac3Config::parse(&dec3.payload)?))
            }
            other => Err(Error::unsupported(format!("audio sample entry {other}"))),
        }
    }

    /// Combine the codec configuration with the sample entry fields.
    ///
    /// `calculated_bit_rate` comes from the sample sizes; AAC prefers the
    /// descriptor's average bitrate when it is set.
    pub fn track_data(&self, entry: &SampleEntry, calculated_bit_rate: u64) -> AudioTrackData {
        let (channels, bits_per_sample, packet_size, sample_rate) = match *entry {
            SampleEntry::Audio {
                channels,
                bits_per_sample,
                packet_size,
                sample_rate,
                ..
            } => (
                channels as u32,
                bits_per_sample as u32,
                packet_size as u32,
                sample_rate,
            ),
            _ => (0, 0, 0, 0),
        };

        match self {
            Self::Aac(esds) => AudioTrackData {
                four_cc: esds.four_cc().to_string(),
                codec_private_data: esds.codec_private_data(),
                bit_rate: if esds.avg_bitrate != 0 {
                    esds.avg_bitrate as u64
                } else {
                    calculated_bit_rate
                },
                channels,
                sampling_rate: sample_rate,
                bits_per_sample,
                packet_size: if packet_size != 0 {
                    packet_size
                } else {
                    channels * 2
                },
                audio_tag: AUDIO_TAG_AAC,
            },
            Self::Eac3(dec3) => AudioTrackData {
                four_cc: "EC-3".to_string(),
                codec_private_data: dec3.codec_private_data(),
                bit_rate: calculated_bit_rate,
                channels: dec3.channel_count() as u32,
                sampling_rate: dec3.sample_rate(),
                bits_per_sample,
                packet_size: dec3.packet_size(),
                audio_tag: AUDIO_TAG_EAC3,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::parse_boxes;
    use crate::testing;
    use assert_matches::assert_matches;
    use bytes::Bytes;

    fn entry(data: Vec<u8>) -> BoxNode {
        parse_boxes(Bytes::from(data)).unwrap().remove(0)
    }

    #[test]
    fn test_aac_track_data() {
        let mp4a = entry(testing::mp4a(2, 16, 48_000, &testing::esds(0x40, 0, &[0x11, 0x90])));
        let codec = AudioCodec::from_entry(&mp4a).unwrap();
        let data = codec.track_data(&SampleEntry::parse(&mp4a).unwrap(), 64_000);

        assert_eq!(data.four_cc, "AACL");
        assert_eq!(data.codec_private_data, "1190");
        assert_eq!(data.bit_rate, 64_000);
        assert_eq!(data.channels, 2);
        assert_eq!(data.sampling_rate, 48_000);
        assert_eq!(data.bits_per_sample, 16);
        // packet size falls back to channels * 2
        assert_eq!(data.packet_size, 4);
        assert_eq!(data.audio_tag, 255);
    }

    #[test]
    fn test_aac_prefers_descriptor_bitrate() {
        let mp4a = entry(testing::mp4a(2, 16, 48_000, &testing::esds(0x40, 96_000, &[0x11, 0x90])));
        let codec = AudioCodec::from_entry(&mp4a).unwrap();
        let data = codec.track_data(&SampleEntry::parse(&mp4a).unwrap(), 64_000);
        assert_eq!(data.bit_rate, 96_000);
    }

    #[test]
    fn test_eac3_track_data() {
        let ec3 = entry(testing::ec3(2, 48_000, &testing::dec3(&[0x06, 0x00, 0x20, 0x0F, 0x00])));
        let codec = AudioCodec::from_entry(&ec3).unwrap();
        assert_matches!(codec, AudioCodec::Eac3(_));

        let data = codec.track_data(&SampleEntry::parse(&ec3).unwrap(), 192_000);
        assert_eq!(data.four_cc, "EC-3");
        assert_eq!(data.channels, 6);
        assert_eq!(data.sampling_rate, 48_000);
        assert_eq!(data.packet_size, 768);
        assert_eq!(data.audio_tag, 65534);
        assert_eq!(data.bit_rate, 192_000);
    }

    #[test]
    fn test_missing_config_box() {
        let mp4a = entry(testing::mp4a(2, 16, 48_000, &[]));
        assert_matches!(
            AudioCodec::from_entry(&mp4a),
            Err(Error::MissingRequiredBox("esds"))
        );
    }
}
