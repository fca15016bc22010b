//! Per-file track extraction.

use super::{ChunkList, MediaDuration, TrackRecord};
use crate::codec::{AudioCodec, TextCodec, VideoCodec};
use crate::fragment::{aggregate_fragments, MoofFragment};
use crate::mp4::{
    first_entry, parse_handler, parse_sync_samples, parse_total_sample_size, BoxNode, BoxType,
    ChunkSegmenter, HandlerType, MediaHeader, MovieExtendsHeader, MovieHeader, SampleEntry,
    TimeToSample, TrackExtends, TrackHeader,
};
use crate::{Error, Result};
use ismforge_common::language::{language_from_filename, UNDETERMINED};
use ismforge_common::TrackType;
use tracing::debug;

/// Tracks and overall duration of one media file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct MediaInfo {
    pub duration: MediaDuration,
    pub tracks: Vec<TrackRecord>,
}

/// Movie-level state shared by every `trak`.
struct MovieContext<'a> {
    /// `mvhd` duration, the bitrate divisor.
    movie_duration: MediaDuration,
    /// `mehd` fragment duration, used when `mvhd` carries none.
    fragment_duration: Option<MediaDuration>,
    mvex: Option<&'a BoxNode>,
    trexes: Vec<TrackExtends>,
    moofs: &'a [BoxNode],
    blob_name: &'a str,
}

impl MovieContext<'_> {
    /// `trex` for a `tkhd` ID: the matching one, else the first one.
    fn trex_for(&self, tkhd_id: u32) -> Option<&TrackExtends> {
        self.trexes
            .iter()
            .find(|trex| trex.track_id == tkhd_id)
            .or_else(|| self.trexes.first())
    }

    fn bit_rate(&self, chunks: &ChunkList, bytes: u64) -> u64 {
        let divisor = [Some(self.movie_duration), self.fragment_duration]
            .into_iter()
            .flatten()
            .find(|d| !d.is_zero())
            .unwrap_or_else(|| chunks.total());
        divisor.bit_rate(bytes)
    }
}

/// Extract one [`TrackRecord`] per supported `trak` of a file.
///
/// `moofs` are the file's movie fragments in file order; they are only
/// consulted when the `moov` carries an `mvex`. Tracks with an unknown
/// handler are skipped.
pub fn extract_media(moov: &BoxNode, moofs: &[BoxNode], blob_name: &str) -> Result<MediaInfo> {
    let mvhd = moov
        .child(BoxType::MVHD)
        .ok_or(Error::MissingRequiredBox("mvhd"))?;
    let mvhd = MovieHeader::parse(&mvhd.payload)?;

    let mvex = moov.child(BoxType::MVEX);
    let movie_duration = MediaDuration::new(mvhd.duration, mvhd.timescale);
    let mut fragment_duration = None;
    let mut trexes = Vec::new();
    if let Some(mvex) = mvex {
        if let Some(mehd) = mvex.child(BoxType::MEHD) {
            let mehd = MovieExtendsHeader::parse(&mehd.payload)?;
            fragment_duration = Some(MediaDuration::new(mehd.fragment_duration, mvhd.timescale));
        }
        trexes = mvex
            .children_of(BoxType::TREX)
            .map(|trex| TrackExtends::parse(&trex.payload))
            .collect::<Result<_>>()?;
    }

    // the asset lasts as long as its fragments when mehd says so
    let duration = fragment_duration.unwrap_or(movie_duration);
    let ctx = MovieContext {
        movie_duration,
        fragment_duration,
        mvex,
        trexes,
        moofs,
        blob_name,
    };

    let mut tracks = Vec::new();
    for trak in moov.children_of(BoxType::TRAK) {
        if let Some(track) = extract_track(&ctx, trak)? {
            tracks.push(track);
        }
    }

    debug!(
        blob = blob_name,
        tracks = tracks.len(),
        duration = duration.seconds(),
        "Extracted media info"
    );
    Ok(MediaInfo { duration, tracks })
}

fn extract_track(ctx: &MovieContext<'_>, trak: &BoxNode) -> Result<Option<TrackRecord>> {
    let tkhd = trak
        .child(BoxType::TKHD)
        .ok_or(Error::MissingRequiredBox("tkhd"))?;
    let tkhd = TrackHeader::parse(&tkhd.payload)?;

    let mdia = trak
        .child(BoxType::MDIA)
        .ok_or(Error::MissingRequiredBox("mdia"))?;
    let hdlr = mdia
        .child(BoxType::HDLR)
        .ok_or(Error::MissingRequiredBox("hdlr"))?;
    let track_type = match parse_handler(&hdlr.payload)? {
        HandlerType::Video => TrackType::Video,
        HandlerType::Audio => TrackType::Audio,
        HandlerType::Text => TrackType::Text,
        HandlerType::Unknown(handler) => {
            debug!(
                track_id = tkhd.track_id,
                handler = %String::from_utf8_lossy(&handler),
                "Skipping track with unknown handler"
            );
            return Ok(None);
        }
    };

    let mdhd = mdia
        .child(BoxType::MDHD)
        .ok_or(Error::MissingRequiredBox("mdhd"))?;
    let mdhd = MediaHeader::parse(&mdhd.payload)?;
    let stbl = mdia
        .find_first(BoxType::STBL)
        .ok_or(Error::MissingRequiredBox("stbl"))?;
    let stsd = stbl
        .child(BoxType::STSD)
        .ok_or(Error::MissingRequiredBox("stsd"))?;
    let entry = first_entry(stsd)?;

    let trex = ctx.trex_for(tkhd.track_id);
    let track_id = trex.map_or(tkhd.track_id, |trex| trex.track_id);
    let fragment = match ctx.mvex {
        Some(_) if !ctx.moofs.is_empty() => {
            aggregate_fragments(ctx.moofs, trex)?.remove(&track_id)
        }
        _ => None,
    };

    let mut record = TrackRecord::new(track_id, track_type, ctx.blob_name);
    debug!(
        track_id,
        track_type = %track_type,
        format = %entry.box_type,
        timescale = mdhd.timescale,
        "Track"
    );

    match track_type {
        TrackType::Video => {
            let keyframes = match stbl.child(BoxType::STSS) {
                Some(stss) => parse_sync_samples(&stss.payload)?,
                None => Vec::new(),
            };
            let (chunks, size) = if !keyframes.is_empty() {
                let stts = time_to_sample(stbl)?;
                let chunks = ChunkSegmenter::new(mdhd.timescale)
                    .keyframes(&keyframes)
                    .build(&stts);
                (ChunkList::new(mdhd.timescale, chunks), sample_bytes(stbl)?)
            } else if ctx.mvex.is_none() {
                return Err(Error::MissingRequiredBox("stss"));
            } else {
                fragment_chunks(require_fragment(fragment)?, mdhd.timescale)
            };

            let codec = VideoCodec::from_entry(entry)?;
            record.four_cc = codec.four_cc().to_string();
            record.codec_private_data = codec.codec_private_data()?;
            record.bit_rate = ctx.bit_rate(&chunks, size);
            record.chunks = chunks;
            if let SampleEntry::Visual { width, height, .. } = SampleEntry::parse(entry)? {
                record.width = Some(width as u32);
                record.height = Some(height as u32);
            }
        }
        TrackType::Audio => {
            let (chunks, size) = match fragment {
                Some(fragment) => fragment_chunks(fragment, mdhd.timescale),
                None if ctx.mvex.is_some() => return Err(Error::MissingRequiredBox("moof")),
                None => {
                    let stts = time_to_sample(stbl)?;
                    let chunks = ChunkSegmenter::new(mdhd.timescale).build(&stts);
                    (ChunkList::new(mdhd.timescale, chunks), sample_bytes(stbl)?)
                }
            };

            let codec = AudioCodec::from_entry(entry)?;
            let data = codec.track_data(&SampleEntry::parse(entry)?, ctx.bit_rate(&chunks, size));
            record.four_cc = data.four_cc;
            record.codec_private_data = data.codec_private_data;
            record.bit_rate = data.bit_rate;
            record.chunks = chunks;
            record.channels = Some(data.channels);
            record.sampling_rate = Some(data.sampling_rate);
            record.bits_per_sample = Some(data.bits_per_sample);
            record.packet_size = Some(data.packet_size);
            record.audio_tag = Some(data.audio_tag);
            record.language = Some(mdhd.language);
        }
        TrackType::Text => {
            if ctx.mvex.is_none() {
                return Err(Error::MissingRequiredBox("mvex"));
            }
            let codec = TextCodec::from_format(entry.box_type)?;
            let (chunks, size) = fragment_chunks(require_fragment(fragment)?, mdhd.timescale);
            record.four_cc = codec.four_cc().to_string();
            record.bit_rate = ctx.bit_rate(&chunks, size);
            record.chunks = chunks;
            record.language = Some(if mdhd.language.is_empty() || mdhd.language == UNDETERMINED {
                language_from_filename(ctx.blob_name).to_string()
            } else {
                mdhd.language
            });
        }
    }

    Ok(Some(record))
}

fn time_to_sample(stbl: &BoxNode) -> Result<TimeToSample> {
    let stts = stbl
        .child(BoxType::STTS)
        .ok_or(Error::MissingRequiredBox("stts"))?;
    TimeToSample::parse(&stts.payload)
}

/// Total sample bytes from `stsz`, 0 when the table is absent.
fn sample_bytes(stbl: &BoxNode) -> Result<u64> {
    match stbl.child(BoxType::STSZ) {
        Some(stsz) => parse_total_sample_size(&stsz.payload),
        None => Ok(0),
    }
}

/// A track of a fragmented movie needs at least one `moof` carrying it.
fn require_fragment(fragment: Option<MoofFragment>) -> Result<MoofFragment> {
    fragment.ok_or(Error::MissingRequiredBox("moof"))
}

fn fragment_chunks(fragment: MoofFragment, timescale: u32) -> (ChunkList, u64) {
    let size = fragment.total_size();
    (ChunkList::new(timescale, fragment.durations), size)
}
