//! Merging per-file track lists into one asset.
//!
//! An asset is spread over several files: one per video quality, often each
//! carrying the same audio tracks, plus optional index files whose tracks
//! refine the chunk lists of a media track.

use crate::track::{MediaDuration, MediaInfo, TrackRecord};
use ismforge_common::language::{self, UNDETERMINED};
use ismforge_common::TrackType;
use std::collections::HashMap;
use tracing::{debug, info};

/// Merge media and index file results into the asset's track list.
///
/// The asset duration is the longest of all files. Tracks are ordered by
/// `(track_id, bit_rate)`, then grouped as video, deduplicated and named
/// audio, then text.
pub fn aggregate_tracks<M, I>(media: M, indexes: I) -> MediaInfo
where
    M: IntoIterator<Item = MediaInfo>,
    I: IntoIterator<Item = MediaInfo>,
{
    let mut duration = MediaDuration::default();
    let mut tracks = Vec::new();
    for info in media {
        duration = duration.max(info.duration);
        tracks.extend(info.tracks);
    }
    sort_tracks(&mut tracks);

    for info in indexes {
        duration = duration.max(info.duration);
        for index in &info.tracks {
            for track in tracks.iter_mut().filter(|t| index_matches(t, index)) {
                track.chunks = index.chunks.clone();
                track.bit_rate = index.bit_rate;
                track.index_blob_name = Some(index.source_blob_name.clone());
                info!(
                    track_id = track.track_id,
                    source = %track.source_blob_name,
                    index = %index.source_blob_name,
                    "Applied index track"
                );
            }
        }
    }
    sort_tracks(&mut tracks);

    let (mut video, mut audio, mut text) = (Vec::new(), Vec::new(), Vec::new());
    for track in tracks {
        match track.track_type {
            TrackType::Video => video.push(track),
            TrackType::Audio => audio.push(track),
            TrackType::Text => text.push(track),
        }
    }

    video.extend(name_audio_tracks(dedup_audio(audio)));
    video.extend(text);
    MediaInfo {
        duration,
        tracks: video,
    }
}

fn sort_tracks(tracks: &mut [TrackRecord]) {
    tracks.sort_by_key(|t| (t.track_id, t.bit_rate));
}

/// An index track refines a media track with the same identity.
fn index_matches(track: &TrackRecord, index: &TrackRecord) -> bool {
    if track.track_id != index.track_id
        || track.codec_private_data != index.codec_private_data
        || track.bit_rate != index.bit_rate
        || track.track_type != index.track_type
    {
        return false;
    }
    match track.track_type {
        TrackType::Video => track.width == index.width && track.height == index.height,
        TrackType::Audio => {
            track.sampling_rate == index.sampling_rate
                && track.channels == index.channels
                && track.same_language(index)
        }
        TrackType::Text => false,
    }
}

/// Drop audio tracks repeating the language and bitrate of the previous one.
fn dedup_audio(tracks: Vec<TrackRecord>) -> Vec<TrackRecord> {
    let mut kept: Vec<TrackRecord> = Vec::with_capacity(tracks.len());
    for track in tracks {
        if let Some(last) = kept.last() {
            if last.same_language(&track) && last.bit_rate == track.bit_rate {
                debug!(
                    track_id = track.track_id,
                    source = %track.source_blob_name,
                    "Dropping duplicate audio track"
                );
                continue;
            }
        }
        kept.push(track);
    }
    kept
}

/// Normalise languages and give every audio track ID a display name.
///
/// The first track ID of a language gets the plain language name; later IDs
/// with the same language get a numeric suffix (`German1`, `German2`, ...).
/// Suffixes follow the sorted track ID order, not bitrate or file order, so a
/// track keeps its name across every quality file that carries it.
fn name_audio_tracks(mut tracks: Vec<TrackRecord>) -> Vec<TrackRecord> {
    let mut names: HashMap<u32, String> = HashMap::new();
    let mut per_language: HashMap<String, u32> = HashMap::new();

    for track in &mut tracks {
        let (code, name) = language::resolve(track.language.as_deref().unwrap_or(UNDETERMINED));

        let track_name = match names.get(&track.track_id) {
            Some(existing) => existing.clone(),
            None => {
                let seen = per_language.entry(code.clone()).or_insert(0);
                let assigned = if *seen == 0 {
                    name
                } else {
                    format!("{name}{seen}")
                };
                *seen += 1;
                names.insert(track.track_id, assigned.clone());
                assigned
            }
        };

        track.language = Some(code);
        track.track_name = Some(track_name);
    }
    tracks
}
