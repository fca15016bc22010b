//! E-AC-3 specific box (`dec3`).
//!
//! The codec private data is a WAVEFORMATEXTENSIBLE tail: samples per
//! block, the speaker mask, the E-AC-3 subformat GUID and then the raw
//! `dec3` payload.

use crate::{Error, Result};
use bitstream_io::{BigEndian, BitRead, BitReader};

/// Subformat GUID in the byte order players expect.
const SUBFORMAT_GUID: &str = "af87fba7022dfb42a4d405cd93843bdd";

/// 1536 samples per block, little-endian.
const SAMPLES_PER_BLOCK: &str = "0006";

const SAMPLE_RATES: [u32; 4] = [48_000, 44_100, 32_000, 0];

/// Channel names per audio coding mode.
const ACMOD_CHANNELS: [&[&str]; 8] = [
    &["Ch1", "Ch2"],
    &["C"],
    &["L", "R"],
    &["L", "C", "R"],
    &["L", "R", "Cs"],
    &["L", "C", "R", "Cs"],
    &["L", "R", "Ls", "Rs"],
    &["L", "C", "R", "Ls", "Rs"],
];

/// Channels added by each bit of `chan_loc`.
const CHAN_LOC_CHANNELS: [&str; 9] = [
    "Lc/Rc", "Lrs/Rrs", "Cs", "Ts", "Lsd/Rsd", "Lw/Rw", "Vhl/Vhr", "Vhc", "LFE2",
];

/// Speaker mask bit of a single channel name.
fn speaker_bit(name: &str) -> u16 {
    match name {
        "L" => 0x1,
        "R" => 0x2,
        "C" => 0x4,
        "LFE" => 0x8,
        "Ls" => 0x10,
        "Rs" => 0x20,
        "Lc" => 0x40,
        "Rc" => 0x80,
        "Cs" => 0x100,
        "Lrs" => 0x200,
        "Rrs" => 0x400,
        "Ts" => 0x800,
        "Vhl" => 0x1000,
        "Vhc" => 0x2000,
        "Vhr" => 0x4000,
        _ => 0,
    }
}

/// Decoded independent substream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substream {
    pub fscod: u8,
    pub bsid: u8,
    pub asvc: bool,
    pub bsmod: u8,
    pub acmod: u8,
    pub lfeon: bool,
    pub num_dep_sub: u8,
    pub chan_loc: u16,
}

impl Substream {
    /// Channel names, pairs written as `X/Y`.
    pub fn channel_names(&self) -> Vec<&'static str> {
        let mut names = ACMOD_CHANNELS[self.acmod as usize & 0x07].to_vec();
        if self.lfeon {
            names.push("LFE");
        }
        if self.num_dep_sub > 0 {
            for (bit, name) in CHAN_LOC_CHANNELS.iter().enumerate() {
                if self.chan_loc & (1 << bit) != 0 {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Number of channels; a pair counts twice.
    pub fn channel_count(&self) -> u16 {
        self.channel_names()
            .iter()
            .map(|n| if n.contains('/') { 2 } else { 1 })
            .sum()
    }

    /// Speaker mask over all channels, pairs contributing both bits.
    pub fn channel_mask(&self) -> u16 {
        self.channel_names()
            .iter()
            .flat_map(|n| n.split('/'))
            .fold(0, |mask, n| mask | speaker_bit(n))
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATES[self.fscod as usize & 0x03]
    }
}

/// Decoded `dec3` payload with a single independent substream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eac3Config {
    /// Data rate in kbit/s.
    pub data_rate: u16,
    pub substream: Substream,
    raw: Vec<u8>,
}

impl Eac3Config {
    /// Decode a `dec3` payload.
    ///
    /// Streams with more than one independent substream are rejected with
    /// [`Error::UnsupportedDescriptor`].
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut reader = BitReader::endian(payload, BigEndian);
        let data_rate = reader.read::<u16>(13).map_err(truncated)?;
        let num_ind_sub = reader.read::<u8>(3).map_err(truncated)?;

        if num_ind_sub > 0 {
            return Err(Error::unsupported_descriptor(format!(
                "dec3 with {} independent substreams",
                num_ind_sub + 1
            )));
        }

        let substream = read_substream(&mut reader).map_err(truncated)?;

        Ok(Self {
            data_rate,
            substream,
            raw: payload.to_vec(),
        })
    }

    pub fn channel_count(&self) -> u16 {
        self.substream.channel_count()
    }

    pub fn sample_rate(&self) -> u32 {
        self.substream.sample_rate()
    }

    /// Packet size reported in the client manifest.
    pub fn packet_size(&self) -> u32 {
        4 * self.data_rate as u32
    }

    /// WAVEFORMATEX extension followed by the raw payload, uppercase hex.
    pub fn codec_private_data(&self) -> String {
        let mask = self.substream.channel_mask().to_le_bytes();
        format!(
            "{SAMPLES_PER_BLOCK}{}0000{SUBFORMAT_GUID}{}",
            hex::encode(mask),
            hex::encode(&self.raw)
        )
        .to_uppercase()
    }
}

fn read_substream<R: BitRead>(reader: &mut R) -> std::io::Result<Substream> {
    let fscod = reader.read::<u8>(2)?;
    let bsid = reader.read::<u8>(5)?;
    reader.read::<u8>(1)?; // reserved
    let asvc = reader.read_bit()?;
    let bsmod = reader.read::<u8>(3)?;
    let acmod = reader.read::<u8>(3)?;
    let lfeon = reader.read_bit()?;
    reader.read::<u8>(3)?; // reserved
    let num_dep_sub = reader.read::<u8>(4)?;
    let chan_loc = if num_dep_sub > 0 {
        reader.read::<u16>(9)?
    } else {
        reader.read::<u8>(1)?; // reserved
        0
    };

    Ok(Substream {
        fscod,
        bsid,
        asvc,
        bsmod,
        acmod,
        lfeon,
        num_dep_sub,
        chan_loc,
    })
}

fn truncated(err: std::io::Error) -> Error {
    Error::malformed(format!("dec3 payload truncated: {err}"))
}
