//! Box builders for tests.
//!
//! Each helper returns a complete serialized box so tests can assemble
//! synthetic files from the leaves up.

use bytes::BufMut;

/// Write a box: size (u32 BE) + type + content.
pub fn leaf(box_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + content.len());
    out.put_u32((8 + content.len()) as u32);
    out.put_slice(box_type);
    out.put_slice(content);
    out
}

/// Write a full box: version and flags precede the content.
pub fn full_box(box_type: &[u8; 4], version: u8, flags: u32, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + content.len());
    body.put_u32(((version as u32) << 24) | (flags & 0x00FF_FFFF));
    body.put_slice(content);
    leaf(box_type, &body)
}

/// Write a container box from serialized children.
pub fn container(box_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    leaf(box_type, &children.concat())
}

pub fn mvhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(0); // creation_time
    c.put_u32(0); // modification_time
    c.put_u32(timescale);
    c.put_u32(duration);
    c.put_bytes(0, 80);
    full_box(b"mvhd", 0, 0, &c)
}

pub fn mehd(fragment_duration: u64) -> Vec<u8> {
    full_box(b"mehd", 1, 0, &fragment_duration.to_be_bytes())
}

pub fn tkhd(track_id: u32) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(0);
    c.put_u32(0);
    c.put_u32(track_id);
    c.put_bytes(0, 68);
    full_box(b"tkhd", 0, 3, &c)
}

/// Pack a three-letter code the way `mdhd` stores it.
pub fn pack_language(code: &str) -> u16 {
    code.bytes()
        .take(3)
        .fold(0u16, |acc, b| (acc << 5) | ((b - 0x60) as u16 & 0x1F))
}

pub fn mdhd(timescale: u32, duration: u32, language: &str) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(0);
    c.put_u32(0);
    c.put_u32(timescale);
    c.put_u32(duration);
    c.put_u16(pack_language(language));
    c.put_u16(0);
    full_box(b"mdhd", 0, 0, &c)
}

pub fn hdlr(handler: &[u8; 4]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(0);
    c.put_slice(handler);
    c.put_bytes(0, 12);
    c.put_u8(0); // empty name
    full_box(b"hdlr", 0, 0, &c)
}

/// `stts` from (sample_count, sample_delta) runs.
pub fn stts(runs: &[(u32, u32)]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(runs.len() as u32);
    for &(count, delta) in runs {
        c.put_u32(count);
        c.put_u32(delta);
    }
    full_box(b"stts", 0, 0, &c)
}

pub fn stss(keyframes: &[u32]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(keyframes.len() as u32);
    for &k in keyframes {
        c.put_u32(k);
    }
    full_box(b"stss", 0, 0, &c)
}

/// `stsz` with every sample the same size.
pub fn stsz_constant(sample_size: u32, sample_count: u32) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(sample_size);
    c.put_u32(sample_count);
    full_box(b"stsz", 0, 0, &c)
}

/// `stsz` with a size per sample.
pub fn stsz(sizes: &[u32]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(0);
    c.put_u32(sizes.len() as u32);
    for &s in sizes {
        c.put_u32(s);
    }
    full_box(b"stsz", 0, 0, &c)
}

pub fn stsd(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(entries.len() as u32);
    c.put_slice(&entries.concat());
    full_box(b"stsd", 0, 0, &c)
}

fn visual_entry(format: &[u8; 4], width: u16, height: u16, config: &[u8]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_bytes(0, 6); // reserved
    c.put_u16(1); // data_reference_index
    c.put_bytes(0, 16); // pre_defined + reserved
    c.put_u16(width);
    c.put_u16(height);
    c.put_u32(0x0048_0000); // horizresolution
    c.put_u32(0x0048_0000); // vertresolution
    c.put_u32(0);
    c.put_u16(1); // frame_count
    c.put_bytes(0, 32); // compressorname
    c.put_u16(0x0018); // depth
    c.put_i16(-1);
    c.put_slice(config);
    leaf(format, &c)
}

pub fn avc1(width: u16, height: u16, avcc: &[u8]) -> Vec<u8> {
    visual_entry(b"avc1", width, height, avcc)
}

pub fn hvc1(width: u16, height: u16, hvcc: &[u8]) -> Vec<u8> {
    visual_entry(b"hvc1", width, height, hvcc)
}

/// `avcC` with one SPS and one PPS.
pub fn avcc(sps: &[u8], pps: &[u8]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u8(1); // configurationVersion
    c.put_u8(0x64); // High
    c.put_u8(0);
    c.put_u8(0x1F);
    c.put_u8(0xFC | 3); // 4-byte NAL lengths
    c.put_u8(0xE0 | 1);
    c.put_u16(sps.len() as u16);
    c.put_slice(sps);
    c.put_u8(1);
    c.put_u16(pps.len() as u16);
    c.put_slice(pps);
    leaf(b"avcC", &c)
}

/// `hvcC` with one NAL array per (type, units) pair.
pub fn hvcc(arrays: &[(u8, Vec<Vec<u8>>)]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u8(1); // configurationVersion
    c.put_u8(0x01); // profile_space/tier/profile_idc
    c.put_u32(0x6000_0000); // compatibility flags
    c.put_uint(0x9000_0000_0000, 6); // constraint flags
    c.put_u8(93); // level_idc
    c.put_u16(0xF000); // min_spatial_segmentation
    c.put_u8(0xFC); // parallelismType
    c.put_u8(0xFD); // chroma_format_idc = 1
    c.put_u8(0xF8 | 2); // luma bit depth 10
    c.put_u8(0xF8 | 2); // chroma bit depth 10
    c.put_u16(0); // avgFrameRate
    c.put_u8(0x0F); // lengthSizeMinusOne = 3
    c.put_u8(arrays.len() as u8);
    for (nal_type, units) in arrays {
        c.put_u8(0x80 | (nal_type & 0x3F));
        c.put_u16(units.len() as u16);
        for unit in units {
            c.put_u16(unit.len() as u16);
            c.put_slice(unit);
        }
    }
    leaf(b"hvcC", &c)
}

fn audio_entry(format: &[u8; 4], channels: u16, bits: u16, sample_rate: u32, config: &[u8]) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_bytes(0, 6);
    c.put_u16(1);
    c.put_u16(0); // version
    c.put_u16(0); // revision
    c.put_u32(0); // vendor
    c.put_u16(channels);
    c.put_u16(bits);
    c.put_u16(0); // compression_id
    c.put_u16(0); // packet_size
    c.put_u32(sample_rate << 16);
    c.put_slice(config);
    leaf(format, &c)
}

pub fn mp4a(channels: u16, bits: u16, sample_rate: u32, esds: &[u8]) -> Vec<u8> {
    audio_entry(b"mp4a", channels, bits, sample_rate, esds)
}

pub fn ec3(channels: u16, sample_rate: u32, dec3: &[u8]) -> Vec<u8> {
    audio_entry(b"ec-3", channels, 16, sample_rate, dec3)
}

/// `esds` with an ES_Descriptor > DecoderConfig > DecoderSpecificInfo chain.
pub fn esds(object_type_indication: u8, avg_bitrate: u32, audio_specific_config: &[u8]) -> Vec<u8> {
    let mut dsi = vec![0x05, audio_specific_config.len() as u8];
    dsi.extend_from_slice(audio_specific_config);

    let mut dcd = Vec::new();
    dcd.put_u8(object_type_indication);
    dcd.put_u8(0x15); // audio stream
    dcd.put_uint(0, 3); // bufferSizeDB
    dcd.put_u32(avg_bitrate.max(128_000)); // maxBitrate
    dcd.put_u32(avg_bitrate);
    dcd.put_slice(&dsi);

    let mut es = Vec::new();
    es.put_u16(1); // ES_ID
    es.put_u8(0); // flags
    es.put_u8(0x04);
    es.put_u8(dcd.len() as u8);
    es.put_slice(&dcd);
    es.put_slice(&[0x06, 0x01, 0x02]); // SLConfigDescriptor

    let mut c = vec![0x03, es.len() as u8];
    c.extend_from_slice(&es);
    full_box(b"esds", 0, 0, &c)
}

pub fn dec3(payload: &[u8]) -> Vec<u8> {
    leaf(b"dec3", payload)
}

pub fn stpp() -> Vec<u8> {
    let mut c = Vec::new();
    c.put_bytes(0, 6);
    c.put_u16(1);
    c.put_slice(b"http://www.w3.org/ns/ttml\0");
    c.put_u8(0); // schema_location
    c.put_u8(0); // auxiliary_mime_types
    leaf(b"stpp", &c)
}

pub fn wvtt() -> Vec<u8> {
    let mut c = Vec::new();
    c.put_bytes(0, 6);
    c.put_u16(1);
    c.put_slice(&leaf(b"vttC", b"WEBVTT"));
    leaf(b"wvtt", &c)
}

pub fn trex(track_id: u32, default_duration: u32, default_size: u32) -> Vec<u8> {
    let mut c = Vec::new();
    c.put_u32(track_id);
    c.put_u32(1);
    c.put_u32(default_duration);
    c.put_u32(default_size);
    c.put_u32(0);
    full_box(b"trex", 0, 0, &c)
}

pub fn tfhd(track_id: u32, default_duration: Option<u32>, default_size: Option<u32>) -> Vec<u8> {
    let mut flags = 0x02_0000; // default-base-is-moof
    let mut c = Vec::new();
    c.put_u32(track_id);
    if let Some(d) = default_duration {
        flags |= 0x08;
        c.put_u32(d);
    }
    if let Some(s) = default_size {
        flags |= 0x10;
        c.put_u32(s);
    }
    full_box(b"tfhd", 0, flags, &c)
}

/// `trun` with optional per-sample durations and sizes (empty = absent).
pub fn trun(sample_count: u32, durations: &[u32], sizes: &[u32]) -> Vec<u8> {
    let mut flags = 0x001;
    if !durations.is_empty() {
        flags |= 0x100;
    }
    if !sizes.is_empty() {
        flags |= 0x200;
    }
    let mut c = Vec::new();
    c.put_u32(sample_count);
    c.put_i32(0); // data_offset
    for i in 0..sample_count as usize {
        if let Some(&d) = durations.get(i) {
            c.put_u32(d);
        }
        if let Some(&s) = sizes.get(i) {
            c.put_u32(s);
        }
    }
    full_box(b"trun", 0, flags, &c)
}

pub fn moof(sequence: u32, trafs: &[Vec<u8>]) -> Vec<u8> {
    let mut children = vec![full_box(b"mfhd", 0, 0, &sequence.to_be_bytes())];
    children.extend_from_slice(trafs);
    container(b"moof", &children)
}

pub fn traf(tfhd: Vec<u8>, trun: Vec<u8>) -> Vec<u8> {
    container(b"traf", &[tfhd, trun])
}

/// Fluent builder for a `trak` box.
#[derive(Debug, Clone)]
pub struct TrakBuilder {
    track_id: u32,
    handler: [u8; 4],
    timescale: u32,
    duration: u32,
    language: String,
    sample_entry: Vec<u8>,
    tables: Vec<Vec<u8>>,
}

impl TrakBuilder {
    pub fn new(track_id: u32, handler: &[u8; 4], timescale: u32) -> Self {
        Self {
            track_id,
            handler: *handler,
            timescale,
            duration: 0,
            language: "und".to_string(),
            sample_entry: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn language(mut self, code: &str) -> Self {
        self.language = code.to_string();
        self
    }

    pub fn duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    pub fn sample_entry(mut self, entry: Vec<u8>) -> Self {
        self.sample_entry = entry;
        self
    }

    /// Add an `stbl` table box (stts, stss, stsz...).
    pub fn table(mut self, table: Vec<u8>) -> Self {
        self.tables.push(table);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut stbl = vec![stsd(&[self.sample_entry])];
        stbl.extend(self.tables);
        let minf = container(b"minf", &[container(b"stbl", &stbl)]);
        let mdia = container(
            b"mdia",
            &[
                mdhd(self.timescale, self.duration, &self.language),
                hdlr(&self.handler),
                minf,
            ],
        );
        container(b"trak", &[tkhd(self.track_id), mdia])
    }
}
