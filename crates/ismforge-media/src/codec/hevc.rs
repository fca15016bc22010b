//! HEVC decoder configuration (`hvcC`).

use super::START_CODE;
use crate::mp4::PayloadReader;
use crate::{Error, Result};

/// Decoded `hvcC` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HevcConfig {
    pub configuration_version: u8,
    pub profile_space: u8,
    pub tier_flag: bool,
    pub profile_idc: u8,
    pub profile_compatibility_flags: u32,
    pub constraint_indicator_flags: u64,
    pub level_idc: u8,
    pub min_spatial_segmentation: u16,
    pub parallelism_type: u8,
    pub chroma_format: u8,
    pub bit_depth_luma: u8,
    pub bit_depth_chroma: u8,
    pub avg_frame_rate: u16,
    pub constant_frame_rate: u8,
    pub num_temporal_layers: u8,
    pub temporal_id_nested: bool,
    pub nal_length_size: u8,
    pub arrays: Vec<NalArray>,
}

/// One parameter set array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalArray {
    pub array_completeness: bool,
    pub nal_unit_type: u8,
    pub units: Vec<Vec<u8>>,
}

impl HevcConfig {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let configuration_version = r.read_u8()?;
        let b = r.read_u8()?;
        let profile_space = b >> 6;
        let tier_flag = (b >> 5) & 0x01 == 1;
        let profile_idc = b & 0x1F;
        let profile_compatibility_flags = r.read_u32()?;
        let constraint_indicator_flags = r.read_u48()?;
        let level_idc = r.read_u8()?;
        let min_spatial_segmentation = r.read_u16()? & 0x0FFF;
        let parallelism_type = r.read_u8()? & 0x03;
        let chroma_format = r.read_u8()? & 0x03;
        let bit_depth_luma = 8 + (r.read_u8()? & 0x07);
        let bit_depth_chroma = 8 + (r.read_u8()? & 0x07);
        let avg_frame_rate = r.read_u16()?;
        let b = r.read_u8()?;
        let constant_frame_rate = b >> 6;
        let num_temporal_layers = (b >> 3) & 0x07;
        let temporal_id_nested = (b >> 2) & 0x01 == 1;
        let nal_length_size = 1 + (b & 0x03);

        let array_count = r.read_u8()?;
        let mut arrays = Vec::with_capacity(array_count as usize);
        for _ in 0..array_count {
            let b = r.read_u8()?;
            let unit_count = r.read_u16()?;
            let mut units = Vec::with_capacity(unit_count as usize);
            for _ in 0..unit_count {
                let len = r.read_u16()? as usize;
                units.push(r.read_slice(len)?.to_vec());
            }
            arrays.push(NalArray {
                array_completeness: b >> 7 == 1,
                nal_unit_type: b & 0x3F,
                units,
            });
        }

        Ok(Self {
            configuration_version,
            profile_space,
            tier_flag,
            profile_idc,
            profile_compatibility_flags,
            constraint_indicator_flags,
            level_idc,
            min_spatial_segmentation,
            parallelism_type,
            chroma_format,
            bit_depth_luma,
            bit_depth_chroma,
            avg_frame_rate,
            constant_frame_rate,
            num_temporal_layers,
            temporal_id_nested,
            nal_length_size,
            arrays,
        })
    }

    /// All NAL units across arrays, in order.
    pub fn nal_units(&self) -> impl Iterator<Item = &[u8]> {
        self.arrays
            .iter()
            .flat_map(|a| a.units.iter().map(Vec::as_slice))
    }

    /// Start-code prefixed second and third NAL units (SPS and PPS when the
    /// arrays are in VPS, SPS, PPS order) as uppercase hex.
    pub fn codec_private_data(&self) -> Result<String> {
        let units: Vec<&[u8]> = self.nal_units().take(3).collect();
        if units.len() < 3 {
            return Err(Error::MissingRequiredBox("hvcC NAL units"));
        }
        Ok(format!(
            "{START_CODE}{}{START_CODE}{}",
            hex::encode_upper(units[1]),
            hex::encode_upper(units[2])
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use assert_matches::assert_matches;

    fn payload(arrays: &[(u8, Vec<Vec<u8>>)]) -> Vec<u8> {
        // strip the box header written by the builder
        testing::hvcc(arrays)[8..].to_vec()
    }

    #[test]
    fn test_parse_header() {
        let config = HevcConfig::parse(&payload(&[])).unwrap();
        assert_eq!(config.profile_idc, 1);
        assert_eq!(config.level_idc, 93);
        assert_eq!(config.chroma_format, 1);
        assert_eq!(config.bit_depth_luma, 10);
        assert_eq!(config.bit_depth_chroma, 10);
        assert_eq!(config.nal_length_size, 4);
        assert!(config.arrays.is_empty());
    }

    #[test]
    fn test_codec_private_data() {
        let config = HevcConfig::parse(&payload(&[
            (32, vec![vec![0x40, 0x01]]),
            (33, vec![vec![0x42, 0x01, 0x01]]),
            (34, vec![vec![0x44, 0x01]]),
        ]))
        .unwrap();
        assert_eq!(config.arrays[1].nal_unit_type, 33);
        assert!(config.arrays[0].array_completeness);
        assert_eq!(
            config.codec_private_data().unwrap(),
            "00000001420101000000014401"
        );
    }

    #[test]
    fn test_units_are_flattened_across_arrays() {
        let config = HevcConfig::parse(&payload(&[
            (32, vec![vec![0x40], vec![0x41]]),
            (33, vec![vec![0x42]]),
        ]))
        .unwrap();
        assert_eq!(config.nal_units().count(), 3);
        assert_eq!(config.codec_private_data().unwrap(), "00000001410000000142");
    }

    #[test]
    fn test_too_few_units() {
        let config = HevcConfig::parse(&payload(&[(32, vec![vec![0x40]])])).unwrap();
        assert_matches!(
            config.codec_private_data(),
            Err(Error::MissingRequiredBox("hvcC NAL units"))
        );
    }
}
