//! Box type codes and per-type child layout.

/// Four-character box type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxType(pub [u8; 4]);

impl BoxType {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MDAT: Self = Self(*b"mdat");
    pub const MVHD: Self = Self(*b"mvhd");
    pub const TRAK: Self = Self(*b"trak");
    pub const TKHD: Self = Self(*b"tkhd");
    pub const EDTS: Self = Self(*b"edts");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const HDLR: Self = Self(*b"hdlr");
    pub const MINF: Self = Self(*b"minf");
    pub const DINF: Self = Self(*b"dinf");
    pub const STBL: Self = Self(*b"stbl");
    pub const STSD: Self = Self(*b"stsd");
    pub const STTS: Self = Self(*b"stts");
    pub const STSS: Self = Self(*b"stss");
    pub const STSZ: Self = Self(*b"stsz");
    pub const MVEX: Self = Self(*b"mvex");
    pub const MEHD: Self = Self(*b"mehd");
    pub const TREX: Self = Self(*b"trex");
    pub const MOOF: Self = Self(*b"moof");
    pub const MFHD: Self = Self(*b"mfhd");
    pub const TRAF: Self = Self(*b"traf");
    pub const TFHD: Self = Self(*b"tfhd");
    pub const TFDT: Self = Self(*b"tfdt");
    pub const TRUN: Self = Self(*b"trun");
    pub const MFRA: Self = Self(*b"mfra");
    pub const UUID: Self = Self(*b"uuid");
    pub const UDTA: Self = Self(*b"udta");

    // Sample entries
    pub const AVC1: Self = Self(*b"avc1");
    pub const AVC3: Self = Self(*b"avc3");
    pub const HVC1: Self = Self(*b"hvc1");
    pub const HEV1: Self = Self(*b"hev1");
    pub const ENCV: Self = Self(*b"encv");
    pub const MP4A: Self = Self(*b"mp4a");
    pub const EC3: Self = Self(*b"ec-3");
    pub const AC3: Self = Self(*b"ac-3");
    pub const ENCA: Self = Self(*b"enca");
    pub const STPP: Self = Self(*b"stpp");
    pub const WVTT: Self = Self(*b"wvtt");

    // Codec configuration
    pub const AVCC: Self = Self(*b"avcC");
    pub const HVCC: Self = Self(*b"hvcC");
    pub const ESDS: Self = Self(*b"esds");
    pub const DEC3: Self = Self(*b"dec3");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// How the payload of this box type is split into fields and children.
    pub(crate) fn layout(&self) -> ChildLayout {
        match *self {
            Self::MOOV
            | Self::TRAK
            | Self::EDTS
            | Self::MDIA
            | Self::MINF
            | Self::DINF
            | Self::STBL
            | Self::MVEX
            | Self::MOOF
            | Self::TRAF
            | Self::MFRA
            | Self::UDTA => ChildLayout::Container,
            // version/flags + entry_count
            Self::STSD => ChildLayout::Prefixed(8),
            // VisualSampleEntry fields
            Self::AVC1 | Self::AVC3 | Self::HVC1 | Self::HEV1 | Self::ENCV => {
                ChildLayout::Prefixed(78)
            }
            Self::MP4A | Self::EC3 | Self::AC3 | Self::ENCA => ChildLayout::AudioEntry,
            Self::WVTT => ChildLayout::Prefixed(8),
            Self::STPP => ChildLayout::XmlSubtitleEntry,
            _ => ChildLayout::Leaf,
        }
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Child layout of a box payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildLayout {
    /// Opaque payload, no children.
    Leaf,
    /// Payload is entirely child boxes.
    Container,
    /// Fixed-size fields, then child boxes.
    Prefixed(usize),
    /// AudioSampleEntry: field size depends on the QuickTime sound version.
    AudioEntry,
    /// XMLSubtitleSampleEntry: fixed fields plus three NUL-terminated strings.
    XmlSubtitleEntry,
}

/// Handler type for a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerType {
    Video,
    Audio,
    Text,
    Unknown([u8; 4]),
}

impl HandlerType {
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        match &bytes {
            b"vide" => Self::Video,
            b"soun" => Self::Audio,
            b"text" | b"subt" | b"sbtl" => Self::Text,
            _ => Self::Unknown(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_type_display() {
        assert_eq!(BoxType::MOOV.to_string(), "moov");
        assert_eq!(BoxType::EC3.as_str(), "ec-3");
        assert_eq!(BoxType::from_bytes([0xff, 0, 0, 0]).as_str(), "????");
    }

    #[test]
    fn test_layouts() {
        assert_eq!(BoxType::MOOV.layout(), ChildLayout::Container);
        assert_eq!(BoxType::TRAF.layout(), ChildLayout::Container);
        assert_eq!(BoxType::STSD.layout(), ChildLayout::Prefixed(8));
        assert_eq!(BoxType::AVC1.layout(), ChildLayout::Prefixed(78));
        assert_eq!(BoxType::MP4A.layout(), ChildLayout::AudioEntry);
        assert_eq!(BoxType::STTS.layout(), ChildLayout::Leaf);
        assert_eq!(BoxType::MDAT.layout(), ChildLayout::Leaf);
    }

    #[test]
    fn test_handler_type() {
        assert_eq!(HandlerType::from_bytes(*b"vide"), HandlerType::Video);
        assert_eq!(HandlerType::from_bytes(*b"soun"), HandlerType::Audio);
        assert_eq!(HandlerType::from_bytes(*b"subt"), HandlerType::Text);
        assert_eq!(
            HandlerType::from_bytes(*b"meta"),
            HandlerType::Unknown(*b"meta")
        );
    }
}
