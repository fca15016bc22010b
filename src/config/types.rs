use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the asset's media, index and subtitle files
    #[serde(default = "default_container")]
    pub container: PathBuf,
}

fn default_container() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    /// Parse files in parallel
    #[serde(default = "default_multithreading")]
    pub multithreading: bool,

    /// Worker count (default: number of CPUs)
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

fn default_multithreading() -> bool {
    true
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            multithreading: default_multithreading(),
            worker_threads: None,
        }
    }
}

impl ProcessingConfig {
    /// Effective size of the worker pool.
    pub fn threads(&self) -> usize {
        if !self.multithreading {
            return 1;
        }
        self.worker_threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ManifestConfig {
    /// Manifest base name; defaults to the key of the first processed file
    #[serde(default)]
    pub name: Option<String>,

    /// Replace manifests that already exist
    #[serde(default)]
    pub overwrite: bool,

    /// Where manifests are written (default: the storage container)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Directory manifests are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.manifest
            .output_dir
            .clone()
            .unwrap_or_else(|| self.storage.container.clone())
    }
}
