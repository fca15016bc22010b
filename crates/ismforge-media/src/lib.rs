//! Ismforge-Media: ISO-BMFF parsing and Smooth Streaming track metadata
//!
//! This crate turns the `moov` and `moof` boxes of MP4 files into the track
//! records both Smooth Streaming manifests are written from.
//!
//! # Modules
//!
//! - `mp4` - Box tree reader and per-box parsers (headers, sample tables, sample entries)
//! - `codec` - Codec configuration (avcC, hvcC, esds, dec3) and codec private data
//! - `fragment` - Per-track fragment durations and sizes from `moof` boxes
//! - `track` - Track records and per-file extraction
//! - `aggregate` - Merging files into one asset: index refinement, audio dedup and naming
//! - `chunks` - Drift-free, run-length compressed manifest chunk lists
//!
//! # Architecture
//!
//! A manifest is built in three passes:
//!
//! 1. Each file's `moov` (and `moof` boxes, when fragmented) is parsed into a
//!    [`mp4::BoxNode`] forest
//! 2. [`extract_media`] produces one [`TrackRecord`] per supported track, with
//!    chunk durations kept exactly in the track's media timescale
//! 3. [`aggregate_tracks`] merges all files; the manifest writers then convert
//!    chunks with [`chunks::generate_chunk_entries`]

pub mod aggregate;
pub mod chunks;
pub mod codec;
pub mod error;
pub mod fragment;
pub mod mp4;
pub mod track;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use aggregate::aggregate_tracks;
pub use chunks::{generate_chunk_entries, ChunkEntry, MANIFEST_TIMESCALE};
pub use error::{Error, Result};
pub use fragment::{aggregate_fragments, MoofFragment};
pub use track::{extract_media, ChunkList, MediaDuration, MediaInfo, TrackRecord};
