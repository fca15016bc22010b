//! AVC decoder configuration (`avcC`).

use super::START_CODE;
use crate::mp4::PayloadReader;
use crate::{Error, Result};

/// Decoded `avcC` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcConfig {
    pub configuration_version: u8,
    pub profile: u8,
    pub profile_compatibility: u8,
    pub level: u8,
    /// Bytes in each NAL unit length prefix.
    pub nal_length_size: u8,
    pub sps: Vec<Vec<u8>>,
    pub pps: Vec<Vec<u8>>,
}

impl AvcConfig {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let configuration_version = r.read_u8()?;
        let profile = r.read_u8()?;
        let profile_compatibility = r.read_u8()?;
        let level = r.read_u8()?;
        let nal_length_size = 1 + (r.read_u8()? & 0x03);

        let sps_count = r.read_u8()? & 0x1F;
        let sps = read_parameter_sets(&mut r, sps_count)?;
        let pps_count = r.read_u8()?;
        let pps = read_parameter_sets(&mut r, pps_count)?;

        Ok(Self {
            configuration_version,
            profile,
            profile_compatibility,
            level,
            nal_length_size,
            sps,
            pps,
        })
    }

    /// Start-code prefixed first SPS and first PPS as uppercase hex.
    pub fn codec_private_data(&self) -> Result<String> {
        let (sps, pps) = match (self.sps.first(), self.pps.first()) {
            (Some(sps), Some(pps)) => (sps, pps),
            _ => return Err(Error::MissingRequiredBox("avcC parameter sets")),
        };
        Ok(format!(
            "{START_CODE}{}{START_CODE}{}",
            hex::encode_upper(sps),
            hex::encode_upper(pps)
        ))
    }
}

fn read_parameter_sets(r: &mut PayloadReader<'_>, count: u8) -> Result<Vec<Vec<u8>>> {
    let mut sets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = r.read_u16()? as usize;
        sets.push(r.read_slice(len)?.to_vec());
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const AVCC: [u8; 17] = [
        0x01, 0x64, 0x00, 0x1F, 0xFF, 0xE1, // header, 1 SPS
        0x00, 0x04, 0x67, 0x64, 0x00, 0x1F, // SPS
        0x01, 0x00, 0x02, 0x68, 0xEE, // 1 PPS
    ];

    #[test]
    fn test_parse_avcc() {
        let config = AvcConfig::parse(&AVCC).unwrap();
        assert_eq!(config.profile, 0x64);
        assert_eq!(config.level, 0x1F);
        assert_eq!(config.nal_length_size, 4);
        assert_eq!(config.sps, vec![vec![0x67, 0x64, 0x00, 0x1F]]);
        assert_eq!(config.pps, vec![vec![0x68, 0xEE]]);
    }

    #[test]
    fn test_codec_private_data() {
        let config = AvcConfig::parse(&AVCC).unwrap();
        assert_eq!(
            config.codec_private_data().unwrap(),
            "000000016764001F0000000168EE"
        );
    }

    #[test]
    fn test_missing_pps() {
        let mut payload = AVCC[..12].to_vec();
        payload.push(0x00);
        let config = AvcConfig::parse(&payload).unwrap();
        assert!(config.pps.is_empty());
        assert_matches!(
            config.codec_private_data(),
            Err(Error::MissingRequiredBox(_))
        );
    }

    #[test]
    fn test_truncated_sps() {
        assert_matches!(
            AvcConfig::parse(&AVCC[..9]),
            Err(Error::BufferUnderflow { .. })
        );
    }
}
