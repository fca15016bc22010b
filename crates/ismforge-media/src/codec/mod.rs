//! Codec configuration parsing.
//!
//! Sample entries are mapped onto closed enums; anything outside the
//! supported set is an [`Error::Unsupported`] rather than a silent skip.
//!
//! - `avc` / `hevc`: parameter sets from `avcC` / `hvcC`
//! - `aac`: the `esds` descriptor chain
//! - `eac3`: the `dec3` bit fields
//! - `audio`: the audio dispatch producing [`AudioTrackData`]

pub mod aac;
pub mod audio;
pub mod avc;
pub mod eac3;
pub mod hevc;

pub use aac::EsDescriptor;
pub use audio::{AudioCodec, AudioTrackData};
pub use avc::AvcConfig;
pub use eac3::Eac3Config;
pub use hevc::HevcConfig;

use crate::mp4::{BoxNode, BoxType};
use crate::{Error, Result};

/// Annex B start code, as hex.
pub(crate) const START_CODE: &str = "00000001";

/// Closed set of supported video codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCodec {
    Avc(AvcConfig),
    Hevc(HevcConfig),
}

impl VideoCodec {
    /// Read the codec configuration box of a visual sample entry.
    pub fn from_entry(entry: &BoxNode) -> Result<Self> {
        match entry.box_type {
            BoxType::AVC1 | BoxType::AVC3 => {
                let avcc = entry
                    .child(BoxType::AVCC)
                    .ok_or(Error::MissingRequiredBox("avcC"))?;
                Ok(Self::Avc(AvcConfig::parse(&avcc.payload)?))
            }
            BoxType::HVC1 | BoxType::HEV1 => {
                let hvcc = entry
                    .child(BoxType::HVCC)
                    .ok_or(Error::MissingRequiredBox("hvcC"))?;
                Ok(Self::Hevc(HevcConfig::parse(&hvcc.payload)?))
            }
            other => Err(Error::unsupported(format!("video sample entry {other}"))),
        }
    }

    pub fn four_cc(&self) -> &'static str {
        match self {
            Self::Avc(_) => "AVC1",
            Self::Hevc(_) => "HVC1",
        }
    }

    pub fn codec_private_data(&self) -> Result<String> {
        match self {
            Self::Avc(config) => config.codec_private_data(),
            Self::Hevc(config) => config.codec_private_data(),
        }
    }
}

/// Closed set of supported text formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCodec {
    /// TTML in ISO-BMFF (`stpp`).
    Imsc,
    /// WebVTT in ISO-BMFF (`wvtt`).
    Wvtt,
}

impl TextCodec {
    pub fn from_format(format: BoxType) -> Result<Self> {
        match format {
            BoxType::STPP => Ok(Self::Imsc),
            BoxType::WVTT => Ok(Self::Wvtt),
            _ => Err(Error::MissingRequiredBox("text sample entry")),
        }
    }

    pub fn four_cc(&self) -> &'static str {
        match self {
            Self::Imsc => "IMSC",
            Self::Wvtt => "WVTT",
        }
    }
}
