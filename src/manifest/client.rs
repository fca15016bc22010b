//! Client manifest (`.ismc`).
//!
//! Tracks of one type are grouped into stream indexes: consecutive records
//! with the same track ID, chunk layout and language are quality levels of
//! one stream. Standalone subtitle files each become a single-chunk text
//! stream after the media streams.

use super::{element, XmlDocument};
use crate::subtitles::SubtitleInfo;
use anyhow::Result;
use ismforge_common::TrackType;
use ismforge_media::chunks::{asset_duration_ticks, subtitle_chunk_entry};
use ismforge_media::{generate_chunk_entries, ChunkEntry, MediaInfo, TrackRecord, MANIFEST_TIMESCALE};
use tracing::{debug, error, info};

const MAJOR_VERSION: &str = "2";
const HEVC_FOUR_CC: &str = "HVC1";

/// Stream index types in document order.
const STREAM_ORDER: [TrackType; 3] = [TrackType::Audio, TrackType::Video, TrackType::Text];

#[derive(Debug)]
struct StreamIndex {
    stream_type: TrackType,
    name: String,
    language: Option<String>,
    chunk_count: usize,
    quality_levels: Vec<QualityLevel>,
    chunks: Vec<ChunkEntry>,
}

impl StreamIndex {
    fn url(&self) -> String {
        format!("QualityLevels({{bitrate}})/Fragments({}={{start time}})", self.name)
    }
}

#[derive(Debug, Default)]
struct QualityLevel {
    bit_rate: u64,
    four_cc: Option<String>,
    codec_private_data: Option<String>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    sampling_rate: Option<u32>,
    channels: Option<u32>,
    bits_per_sample: Option<u32>,
    packet_size: Option<u32>,
    audio_tag: Option<u32>,
}

impl QualityLevel {
    fn from_track(track: &TrackRecord) -> Self {
        Self {
            bit_rate: track.bit_rate,
            four_cc: Some(track.four_cc.clone()),
            codec_private_data: Some(track.codec_private_data.clone()),
            max_width: track.width,
            max_height: track.height,
            sampling_rate: track.sampling_rate,
            channels: track.channels,
            bits_per_sample: track.bits_per_sample,
            packet_size: track.packet_size,
            audio_tag: track.audio_tag,
        }
    }
}

/// Render the client manifest for the merged tracks and subtitle files.
pub fn generate_client_manifest(media: &MediaInfo, subtitles: &[SubtitleInfo]) -> Result<String> {
    info!("Creating client manifest");

    let mut streams: Vec<StreamIndex> = STREAM_ORDER
        .iter()
        .flat_map(|&track_type| media_stream_indexes(&media.tracks, track_type))
        .collect();
    streams.extend(subtitle_stream_indexes(subtitles));

    let minor_version = if has_hevc(&streams) || has_repeats(&streams) {
        "2"
    } else {
        "0"
    };
    let duration = asset_duration_ticks(media.duration).to_string();
    let time_scale = MANIFEST_TIMESCALE.to_string();

    let mut doc = XmlDocument::new();
    doc.open(element(
        "SmoothStreamingMedia",
        &[
            ("MajorVersion", MAJOR_VERSION),
            ("MinorVersion", minor_version),
            ("Duration", duration.as_str()),
            ("TimeScale", time_scale.as_str()),
        ],
    ))?;
    for stream in &streams {
        write_stream_index(&mut doc, stream)?;
    }
    doc.close("SmoothStreamingMedia")?;
    doc.finish()
}

/// Group the tracks of one type into stream indexes.
fn media_stream_indexes(tracks: &[TrackRecord], track_type: TrackType) -> Vec<StreamIndex> {
    let mut groups: Vec<Vec<&TrackRecord>> = Vec::new();

    for track in tracks.iter().filter(|t| t.track_type == track_type) {
        match groups.last_mut() {
            Some(group) if continues_group(group, track) => {
                let duplicate = group.last().is_some_and(|last| last.bit_rate == track.bit_rate);
                if duplicate {
                    debug!(
                        "Skipping track {} of {}: bitrate {} already listed",
                        track.track_id, track.source_blob_name, track.bit_rate
                    );
                } else {
                    group.push(track);
                }
            }
            _ => groups.push(vec![track]),
        }
    }

    groups
        .into_iter()
        .enumerate()
        .filter_map(|(id, group)| {
            let first = *group.first()?;
            let name = first
                .track_name
                .clone()
                .unwrap_or_else(|| format!("{}_{}", track_type, id));
            Some(StreamIndex {
                stream_type: track_type,
                name,
                language: first.language.clone(),
                chunk_count: first.chunks.len(),
                quality_levels: group.iter().map(|t| QualityLevel::from_track(t)).collect(),
                chunks: generate_chunk_entries(&first.chunks),
            })
        })
        .collect()
}

fn continues_group(group: &[&TrackRecord], track: &TrackRecord) -> bool {
    group.last().is_some_and(|last| {
        last.same_track(track) && last.chunks == track.chunks && last.same_language(track)
    })
}

fn subtitle_stream_indexes(subtitles: &[SubtitleInfo]) -> Vec<StreamIndex> {
    subtitles
        .iter()
        .enumerate()
        .map(|(i, subtitle)| {
            let four_cc = subtitle.four_cc();
            if four_cc.is_none() {
                error!("No FourCC is known for subtitle file {}", subtitle.name);
            }
            StreamIndex {
                stream_type: TrackType::Text,
                name: format!("{}_{}", TrackType::Text, i),
                language: None,
                chunk_count: 1,
                quality_levels: vec![QualityLevel {
                    bit_rate: subtitle.bit_rate,
                    four_cc: four_cc.map(str::to_string),
                    ..Default::default()
                }],
                chunks: vec![subtitle_chunk_entry(subtitle.start, subtitle.duration)],
            }
        })
        .collect()
}

fn has_hevc(streams: &[StreamIndex]) -> bool {
    streams
        .iter()
        .filter(|s| s.stream_type == TrackType::Video)
        .flat_map(|s| &s.quality_levels)
        .any(|q| {
            q.four_cc
                .as_deref()
                .is_some_and(|f| f.eq_ignore_ascii_case(HEVC_FOUR_CC))
        })
}

fn has_repeats(streams: &[StreamIndex]) -> bool {
    streams.iter().flat_map(|s| &s.chunks).any(|c| c.repeat > 1)
}

fn write_stream_index(doc: &mut XmlDocument, stream: &StreamIndex) -> Result<()> {
    let chunk_count = stream.chunk_count.to_string();
    let level_count = stream.quality_levels.len().to_string();
    let url = stream.url();

    let mut attrs = vec![("Type", stream.stream_type.as_str()), ("Name", stream.name.as_str())];
    if let Some(language) = &stream.language {
        attrs.push(("Language", language.as_str()));
    }
    attrs.extend([
        ("Chunks", chunk_count.as_str()),
        ("QualityLevels", level_count.as_str()),
        ("Url", url.as_str()),
    ]);
    doc.open(element("StreamIndex", &attrs))?;

    for (index, level) in stream.quality_levels.iter().enumerate() {
        write_quality_level(doc, index, level)?;
    }

    for chunk in &stream.chunks {
        let t = chunk.time_start.map(|t| t.to_string());
        let d = chunk.duration.to_string();
        let r = chunk.repeat.to_string();
        let mut attrs = Vec::with_capacity(3);
        if let Some(t) = &t {
            attrs.push(("t", t.as_str()));
        }
        attrs.push(("d", d.as_str()));
        attrs.push(("r", r.as_str()));
        doc.empty(element("c", &attrs))?;
    }

    doc.close("StreamIndex")
}

fn write_quality_level(doc: &mut XmlDocument, index: usize, level: &QualityLevel) -> Result<()> {
    let optional = |value: Option<u32>| value.map(|v| v.to_string());

    let mut fields: Vec<(&str, String)> = vec![
        ("Index", index.to_string()),
        ("Bitrate", level.bit_rate.to_string()),
    ];
    if let Some(four_cc) = &level.four_cc {
        fields.push(("FourCC", four_cc.clone()));
    }
    if let Some(cpd) = &level.codec_private_data {
        fields.push(("CodecPrivateData", cpd.clone()));
    }
    let numeric = [
        ("MaxWidth", optional(level.max_width)),
        ("MaxHeight", optional(level.max_height)),
        ("SamplingRate", optional(level.sampling_rate)),
        ("Channels", optional(level.channels)),
        ("BitsPerSample", optional(level.bits_per_sample)),
        ("PacketSize", optional(level.packet_size)),
        ("AudioTag", optional(level.audio_tag)),
    ];
    fields.extend(numeric.into_iter().filter_map(|(k, v)| Some((k, v?))));

    let attrs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
    doc.empty(element("QualityLevel", &attrs))
}
