//! Server manifest (`.ism`).

use super::{client_manifest_name, element, XmlDocument};
use crate::subtitles::SubtitleInfo;
use anyhow::Result;
use ismforge_common::language::{self, UNDETERMINED};
use ismforge_common::TrackType;
use ismforge_media::TrackRecord;
use tracing::{debug, info};

const SMIL_NAMESPACE: &str = "http://www.w3.org/2001/SMIL20/Language";
const UNDEFINED_TRACK_NAME: &str = "Undefined";

/// One `<audio>`, `<video>` or `<textstream>` entry of the switch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SwitchEntry {
    element: &'static str,
    src: String,
    system_bitrate: u64,
    system_language: Option<String>,
    params: Vec<(&'static str, String)>,
}

impl SwitchEntry {
    fn new(element: &'static str, src: &str, system_bitrate: u64) -> Self {
        Self {
            element,
            src: src.to_string(),
            system_bitrate,
            system_language: None,
            params: Vec::new(),
        }
    }

    fn language(mut self, language: Option<&str>) -> Self {
        self.system_language = language.map(str::to_string);
        self
    }

    fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    fn track_index(self, track: &TrackRecord) -> Self {
        match &track.index_blob_name {
            Some(index) => self.param("trackIndex", index.as_str()),
            None => self,
        }
    }
}

/// Render the server manifest for the merged tracks and subtitle files.
pub fn generate_server_manifest(
    name: &str,
    tracks: &[TrackRecord],
    subtitles: &[SubtitleInfo],
) -> Result<String> {
    info!("Creating server manifest {}.ism", name);

    let mut entries = audio_entries(tracks);
    entries.extend(video_entries(tracks));
    entries.extend(text_entries(tracks, subtitles));

    let mut doc = XmlDocument::new();
    doc.declaration()?;
    doc.open(element("smil", &[("xmlns", SMIL_NAMESPACE)]))?;

    doc.open(element("head", &[]))?;
    let client_path = client_manifest_name(name);
    for (meta, content) in [
        ("formats", "mp4"),
        ("fragmentsPerHLSSegment", "1"),
        ("clientManifestRelativePath", client_path.as_str()),
    ] {
        doc.empty(element("meta", &[("name", meta), ("content", content)]))?;
    }
    doc.close("head")?;

    doc.open(element("body", &[]))?;
    doc.open(element("switch", &[]))?;
    for entry in &entries {
        debug!("Adding {} entry for {}", entry.element, entry.src);
        write_entry(&mut doc, entry)?;
    }
    doc.close("switch")?;
    doc.close("body")?;

    doc.close("smil")?;
    doc.finish()
}

fn of_type(tracks: &[TrackRecord], track_type: TrackType) -> impl Iterator<Item = &TrackRecord> {
    tracks.iter().filter(move |t| t.track_type == track_type)
}

fn audio_entries(tracks: &[TrackRecord]) -> Vec<SwitchEntry> {
    let mut entries: Vec<SwitchEntry> = Vec::new();
    for track in of_type(tracks, TrackType::Audio) {
        let entry = SwitchEntry::new("audio", &track.source_blob_name, track.bit_rate)
            .language(track.language.as_deref())
            .param("trackID", track.track_id.to_string())
            .param("trackName", track.track_name.clone().unwrap_or_default())
            .track_index(track);
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    entries
}

fn video_entries(tracks: &[TrackRecord]) -> Vec<SwitchEntry> {
    of_type(tracks, TrackType::Video)
        .map(|track| {
            SwitchEntry::new("video", &track.source_blob_name, track.bit_rate)
                .param("trackID", track.track_id.to_string())
                .track_index(track)
        })
        .collect()
}

fn text_entries(tracks: &[TrackRecord], subtitles: &[SubtitleInfo]) -> Vec<SwitchEntry> {
    let mut entries: Vec<SwitchEntry> = of_type(tracks, TrackType::Text)
        .map(|track| {
            let track_name = track
                .track_name
                .clone()
                .or_else(|| track.language.as_deref().map(|l| language::resolve(l).1))
                .unwrap_or_default();
            SwitchEntry::new("textstream", &track.source_blob_name, track.bit_rate)
                .language(track.language.as_deref())
                .param("trackID", track.track_id.to_string())
                .param("trackName", track_name)
        })
        .collect();

    // subtitle files take the IDs after the media tracks
    let mut track_id = tracks.iter().map(|t| t.track_id).max().unwrap_or(1);
    for subtitle in subtitles {
        track_id += 1;
        entries.push(
            SwitchEntry::new("textstream", &subtitle.name, subtitle.bit_rate)
                .language(subtitle.language.as_deref())
                .param("trackID", track_id.to_string())
                .param("trackName", subtitle_track_name(subtitle.language.as_deref())),
        );
    }
    entries
}

fn subtitle_track_name(code: Option<&str>) -> String {
    match code {
        None | Some(UNDETERMINED) => String::new(),
        Some(code) => language::lookup(code)
            .map(|lang| lang.name.to_string())
            .unwrap_or_else(|| UNDEFINED_TRACK_NAME.to_string()),
    }
}

fn write_entry(doc: &mut XmlDocument, entry: &SwitchEntry) -> Result<()> {
    let bitrate = entry.system_bitrate.to_string();
    let mut attrs = vec![("src", entry.src.as_str()), ("systemBitrate", bitrate.as_str())];
    if let Some(language) = &entry.system_language {
        attrs.push(("systemLanguage", language.as_str()));
    }
    doc.open(element(entry.element, &attrs))?;
    for (name, value) in &entry.params {
        doc.empty(element(
            "param",
            &[("name", *name), ("value", value.as_str()), ("valuetype", "data")],
        ))?;
    }
    doc.close(entry.element)
}
