//! Manifest generation for one container.
//!
//! List the container, parse every media, index and subtitle file on a
//! worker pool, merge the tracks and write both manifests next to the
//! sources (or into the configured output directory).

pub mod collect;

pub use collect::{BlobOutcome, BlobTask, Collected};

use crate::config::Config;
use crate::manifest::{
    client_manifest_name, generate_client_manifest, generate_server_manifest,
    server_manifest_name,
};
use crate::storage::{BlobStore, LocalContainer};
use anyhow::{Context, Result};
use ismforge_common::formats::blob_key;
use ismforge_media::aggregate_tracks;
use std::fmt;
use tracing::{info, warn};

/// What happened to one manifest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestStatus {
    Created(String),
    /// Left alone because it already exists.
    Skipped(String),
}

impl fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(name) => write!(f, "{} (created)", name),
            Self::Skipped(name) => write!(f, "{} (skipped, already exists)", name),
        }
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessingSummary {
    pub manifest_name: String,
    pub server: ManifestStatus,
    pub client: ManifestStatus,
    /// Files that contributed to the manifests.
    pub processed: usize,
    /// Files that failed to parse and were left out.
    pub failed: Vec<String>,
    pub track_count: usize,
}

impl fmt::Display for ProcessingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Manifest: {}", self.manifest_name)?;
        writeln!(f, "  Server manifest: {}", self.server)?;
        writeln!(f, "  Client manifest: {}", self.client)?;
        writeln!(f, "  Files processed: {}", self.processed)?;
        writeln!(f, "  Tracks: {}", self.track_count)?;
        if !self.failed.is_empty() {
            writeln!(f, "  Failed: {}", self.failed.join(", "))?;
        }
        Ok(())
    }
}

/// Run the pipeline over the configured local container.
pub fn run(config: &Config) -> Result<ProcessingSummary> {
    let source = LocalContainer::new(&config.storage.container);
    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    let output = LocalContainer::new(output_dir);
    generate_manifests(&source, &output, config)
}

/// Build both manifests from the blobs in `source` and store them in `output`.
pub fn generate_manifests(
    source: &dyn BlobStore,
    output: &dyn BlobStore,
    config: &Config,
) -> Result<ProcessingSummary> {
    let names = source.list_files().context("Failed to list container")?;
    let tasks = collect::classify(&names);
    if tasks.is_empty() {
        anyhow::bail!("No media or subtitle files found in container");
    }

    let manifest_name = match &config.manifest.name {
        Some(name) => name.clone(),
        None => tasks
            .iter()
            .find_map(|t| blob_key(&t.name))
            .context("Cannot derive a manifest name from the container files")?,
    };
    info!("Generating manifests for {} ({} files)", manifest_name, tasks.len());

    let threads = config.processing.threads();
    let pool = collect::build_pool(threads)?;
    info!("Processing with {} worker thread(s)", threads);

    let collected = collect::collect(source, &tasks, &pool);
    if collected.media.is_empty() && collected.subtitles.is_empty() {
        anyhow::bail!("None of the {} files could be processed", tasks.len());
    }
    let processed = collected.media.len() + collected.indexes.len() + collected.subtitles.len();

    let merged = aggregate_tracks(collected.media, collected.indexes);
    info!("Merged into {} tracks", merged.tracks.len());

    let server_xml = generate_server_manifest(&manifest_name, &merged.tracks, &collected.subtitles)?;
    let client_xml = generate_client_manifest(&merged, &collected.subtitles)?;

    let overwrite = config.manifest.overwrite;
    let server = store_manifest(output, &server_manifest_name(&manifest_name), &server_xml, overwrite)?;
    let client = store_manifest(output, &client_manifest_name(&manifest_name), &client_xml, overwrite)?;

    Ok(ProcessingSummary {
        manifest_name,
        server,
        client,
        processed,
        failed: collected.failed,
        track_count: merged.tracks.len(),
    })
}

fn store_manifest(
    output: &dyn BlobStore,
    name: &str,
    xml: &str,
    overwrite: bool,
) -> Result<ManifestStatus> {
    if !overwrite && output.exists(name)? {
        warn!("Manifest {} already exists, skipping (use --overwrite to replace)", name);
        return Ok(ManifestStatus::Skipped(name.to_string()));
    }

    output
        .upload(name, xml.as_bytes())
        .with_context(|| format!("Failed to write manifest {}", name))?;
    info!("Wrote manifest {}", name);
    Ok(ManifestStatus::Created(name.to_string()))
}
