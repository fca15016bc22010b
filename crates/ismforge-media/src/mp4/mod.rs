//! MP4 container parsing.
//!
//! This module decodes ISO-BMFF buffers into a box tree and provides the
//! per-box parsers needed to describe tracks for a streaming manifest.

mod atoms;
mod headers;
mod payload;
mod sample_entry;
mod sample_table;
mod tree;

pub use atoms::{BoxType, HandlerType};
pub use headers::{
    parse_handler, MediaHeader, MovieExtendsHeader, MovieHeader, TrackExtends,
    TrackFragmentHeader, TrackHeader, TrackRun, TrunSample,
};
pub use payload::PayloadReader;
pub use sample_entry::{first_entry, SampleEntry};
pub use sample_table::{
    parse_sync_samples, parse_total_sample_size, ChunkSegmenter, TimeToSample,
    TimeToSampleEntry, DEFAULT_CHUNK_TARGET_SECS,
};
pub use tree::{find_all_in, find_first_in, parse_boxes, BoxHeader, BoxNode};
