//! Parallel per-file parsing.

use crate::error::BlobError;
use crate::ingest::fetch_media_segments;
use crate::storage::BlobStore;
use crate::subtitles::{probe_subtitle, SubtitleInfo};
use anyhow::{Context, Result};
use ismforge_common::formats::MediaFormat;
use ismforge_media::{extract_media, MediaInfo};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{error, info, info_span};

/// A blob scheduled for parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobTask {
    pub name: String,
    pub format: MediaFormat,
}

/// What parsing one blob produced.
#[derive(Debug, Clone)]
pub enum BlobOutcome {
    Media(MediaInfo),
    Index(MediaInfo),
    Subtitle(SubtitleInfo),
}

/// Results of one collection pass, in listing order.
#[derive(Debug, Default)]
pub struct Collected {
    pub media: Vec<MediaInfo>,
    pub indexes: Vec<MediaInfo>,
    pub subtitles: Vec<SubtitleInfo>,
    /// Blobs that failed to parse.
    pub failed: Vec<String>,
}

impl Collected {
    pub fn is_empty(&self) -> bool {
        self.media.is_empty() && self.indexes.is_empty() && self.subtitles.is_empty()
    }
}

/// Split a listing into parse tasks, skipping files of unknown type.
pub fn classify(names: &[String]) -> Vec<BlobTask> {
    names
        .iter()
        .filter_map(|name| match MediaFormat::from_name(name) {
            Some(format) => Some(BlobTask {
                name: name.clone(),
                format,
            }),
            None => {
                info!("Skipping {}: not a media or subtitle file", name);
                None
            }
        })
        .collect()
}

pub fn build_pool(threads: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .thread_name(|i| format!("ismforge-worker-{}", i + 1))
        .num_threads(threads)
        .build()
        .context("Failed to build worker pool")
}

/// Parse every task on the pool and fold the results in task order.
///
/// A blob that fails is logged and left out; the others are unaffected.
pub fn collect(store: &dyn BlobStore, tasks: &[BlobTask], pool: &ThreadPool) -> Collected {
    let results: Vec<Result<BlobOutcome, BlobError>> = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| {
                let _span = info_span!("blob", name = %task.name).entered();
                process_blob(store, task)
            })
            .collect()
    });

    let mut collected = Collected::default();
    for (task, result) in tasks.iter().zip(results) {
        match result {
            Ok(BlobOutcome::Media(info)) => collected.media.push(info),
            Ok(BlobOutcome::Index(info)) => collected.indexes.push(info),
            Ok(BlobOutcome::Subtitle(info)) => collected.subtitles.push(info),
            Err(e) => {
                error!("Failed to process {}: {}", task.name, e);
                collected.failed.push(task.name.clone());
            }
        }
    }
    collected
}

fn process_blob(store: &dyn BlobStore, task: &BlobTask) -> Result<BlobOutcome, BlobError> {
    if task.format.is_text() {
        info!("Found subtitle file {}", task.name);
        let data = store.download(&task.name)?;
        return Ok(BlobOutcome::Subtitle(probe_subtitle(&task.name, &data)?));
    }

    info!("Parsing {} file {}", task.format, task.name);
    let segments = fetch_media_segments(store, &task.name)?;
    let info = extract_media(&segments.moov, &segments.moofs, &task.name)?;
    info!("{}: {} tracks", task.name, info.tracks.len());

    Ok(if task.format.is_index() {
        BlobOutcome::Index(info)
    } else {
        BlobOutcome::Media(info)
    })
}
