//! MPEG-4 elementary stream descriptor (`esds`) for AAC audio.

use crate::mp4::PayloadReader;
use crate::{Error, Result};

const ES_DESCRIPTOR: u8 = 0x03;
const DECODER_CONFIG_DESCRIPTOR: u8 = 0x04;
const DECODER_SPECIFIC_INFO: u8 = 0x05;

/// AAC Low Complexity.
pub const AOT_AAC_LC: u8 = 2;
/// Spectral Band Replication (HE-AAC).
pub const AOT_SBR: u8 = 5;

/// Fields collected from the descriptor chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EsDescriptor {
    pub es_id: u16,
    pub object_type_indication: u8,
    pub stream_type: u8,
    pub buffer_size: u32,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    /// Raw AudioSpecificConfig.
    pub decoder_specific_info: Vec<u8>,
}

impl EsDescriptor {
    /// Parse an `esds` payload (version and flags first).
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        r.read_full_box_header()?;

        let mut descriptor = Self::default();
        while r.remaining() > 0 {
            let tag = r.read_u8()?;
            let len = read_descriptor_length(&mut r)?;

            match tag {
                // Nested descriptors follow inline, so only the fixed fields are consumed
                ES_DESCRIPTOR => {
                    descriptor.es_id = r.read_u16()?;
                    let flags = r.read_u8()?;
                    if flags & 0x80 != 0 {
                        r.skip(2)?; // dependsOn_ES_ID
                    }
                    if flags & 0x40 != 0 {
                        let url_len = r.read_u8()? as usize;
                        r.skip(url_len)?;
                    }
                    if flags & 0x20 != 0 {
                        r.skip(2)?; // OCR_ES_Id
                    }
                }
                DECODER_CONFIG_DESCRIPTOR => {
                    descriptor.object_type_indication = r.read_u8()?;
                    descriptor.stream_type = r.read_u8()? >> 2;
                    descriptor.buffer_size = r.read_u24()?;
                    descriptor.max_bitrate = r.read_u32()?;
                    descriptor.avg_bitrate = r.read_u32()?;
                }
                DECODER_SPECIFIC_INFO => {
                    descriptor.decoder_specific_info = r.read_slice(len)?.to_vec();
                }
                _ => r.skip(len)?,
            }
        }

        Ok(descriptor)
    }

    /// Audio object type from the AudioSpecificConfig, if present.
    pub fn audio_object_type(&self) -> Option<u8> {
        let asc = &self.decoder_specific_info;
        let first = *asc.first()?;
        let aot = first >> 3;
        if aot == 31 {
            let second = *asc.get(1)?;
            Some(32 + (((first & 0x07) << 3) | (second >> 5)))
        } else {
            Some(aot)
        }
    }

    /// `AACL` for LC and SBR, `AAC` otherwise.
    pub fn four_cc(&self) -> &'static str {
        match self.audio_object_type() {
            Some(AOT_AAC_LC) | Some(AOT_SBR) => "AACL",
            _ => "AAC",
        }
    }

    /// AudioSpecificConfig as uppercase hex.
    pub fn codec_private_data(&self) -> String {
        hex::encode_upper(&self.decoder_specific_info)
    }
}

/// Base-128 length, high bit set on every byte but the last.
fn read_descriptor_length(r: &mut PayloadReader<'_>) -> Result<usize> {
    let mut len = 0usize;
    for _ in 0..4 {
        let b = r.read_u8()?;
        len = (len << 7) | (b & 0x7F) as usize;
        if b & 0x80 == 0 {
            return Ok(len);
        }
    }
    Err(Error::malformed("esds descriptor length longer than four bytes"))
}
