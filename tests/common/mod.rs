//! Shared fixtures for integration tests.
//!
//! [`AssetDir`] lays out a container directory the way an encoder would
//! deliver a multi-bitrate asset: one progressive MP4 per video quality, each
//! carrying the same two audio tracks, plus a WebVTT subtitle file.

#![allow(dead_code)]

use ismforge_media::testing::{self, TrakBuilder};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const VTT: &str = "WEBVTT\n\n\
    00:00:01.000 --> 00:00:04.000\nHello\n\n\
    00:00:05.000 --> 00:00:09.000\nWorld\n";

fn video_entry() -> Vec<u8> {
    testing::avc1(
        1280,
        720,
        &testing::avcc(&[0x67, 0x64, 0x00, 0x1F], &[0x68, 0xEE, 0x3C, 0x80]),
    )
}

/// Video track: 240 frames at 24 fps, a keyframe every 2 s.
fn video_trak(sample_size: u32) -> Vec<u8> {
    TrakBuilder::new(1, b"vide", 24_000)
        .duration(240_000)
        .sample_entry(video_entry())
        .table(testing::stts(&[(240, 1000)]))
        .table(testing::stss(&[1, 49, 97, 145, 193]))
        .table(testing::stsz_constant(sample_size, 240))
        .build()
}

/// AAC-LC track: 470 frames of 1024 samples at 48 kHz.
fn audio_trak(track_id: u32, language: &str) -> Vec<u8> {
    TrakBuilder::new(track_id, b"soun", 48_000)
        .language(language)
        .sample_entry(testing::mp4a(2, 16, 48_000, &testing::esds(0x40, 0, &[0x11, 0x90])))
        .table(testing::stts(&[(470, 1024)]))
        .table(testing::stsz_constant(400, 470))
        .build()
}

/// A 10 second progressive MP4 with one video and two audio tracks.
pub fn quality_file(video_sample_size: u32) -> Vec<u8> {
    let moov = testing::container(
        b"moov",
        &[
            testing::mvhd(1000, 10_000),
            video_trak(video_sample_size),
            audio_trak(2, "eng"),
            audio_trak(3, "ger"),
        ],
    );
    [
        testing::leaf(b"ftyp", b"isom\0\0\0\0isomavc1"),
        moov,
        testing::leaf(b"mdat", &[0; 64]),
    ]
    .concat()
}

/// Index file for the lowest quality: the same video track cut into four
/// 2.5 s fragments, with the same total size.
pub fn index_file() -> Vec<u8> {
    let trak = TrakBuilder::new(1, b"vide", 24_000)
        .sample_entry(video_entry())
        .table(testing::stts(&[]))
        .build();
    let mvex = testing::container(b"mvex", &[testing::trex(1, 0, 0)]);
    let moov = testing::container(b"moov", &[testing::mvhd(1000, 10_000), trak, mvex]);

    let mut parts = vec![testing::leaf(b"ftyp", b"iso6\0\0\0\0iso6piff"), moov];
    for sequence in 1..=4 {
        parts.push(testing::moof(
            sequence,
            &[testing::traf(
                testing::tfhd(1, Some(60_000), None),
                testing::trun(1, &[], &[180_000]),
            )],
        ));
        parts.push(testing::leaf(b"mdat", &[0; 16]));
    }
    parts.concat()
}

pub const INDEX_NAME: &str = "asset_VQ1_1.mpi";

/// Video sample sizes of the three quality files.
pub const QUALITY_SAMPLE_SIZES: [u32; 3] = [3000, 5000, 8000];

pub struct AssetDir {
    pub dir: TempDir,
}

impl AssetDir {
    /// Three quality files and an English subtitle file.
    pub fn new() -> Self {
        let asset = Self {
            dir: TempDir::new().unwrap(),
        };
        for (i, &size) in QUALITY_SAMPLE_SIZES.iter().enumerate() {
            asset.write(&format!("asset_VQ{}.mp4", i + 1), &quality_file(size));
        }
        asset.write("asset_eng.vtt", VTT.as_bytes());
        asset
    }

    /// The standard asset plus an index file refining the first quality.
    pub fn with_index() -> Self {
        let asset = Self::new();
        asset.write(INDEX_NAME, &index_file());
        asset
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, data: &[u8]) {
        std::fs::write(self.file(name), data).unwrap();
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.file(name)).unwrap()
    }
}
