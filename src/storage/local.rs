//! Directory-backed container.

use super::BlobStore;
use bytes::Bytes;
use ismforge_common::{Error, Result};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A container whose blobs are the regular files directly inside a directory.
#[derive(Debug, Clone)]
pub struct LocalContainer {
    root: PathBuf,
}

impl LocalContainer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a blob name to its path, refusing anything outside the root.
    fn blob_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::invalid_input(format!("invalid blob name: {:?}", name)));
        }
        Ok(self.root.join(name))
    }

    fn open(&self, name: &str) -> Result<File> {
        let path = self.blob_path(name)?;
        File::open(&path).map_err(|e| not_found_or_io(e, name))
    }
}

fn not_found_or_io(err: io::Error, name: &str) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::not_found(name)
    } else {
        Error::Io(err)
    }
}

impl BlobStore for LocalContainer {
    fn list_files(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(Error::not_found(self.root.display().to_string()));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::Io(io::Error::other(e)))?;

            // Skip directories
            if entry.file_type().is_dir() {
                continue;
            }

            match entry.file_name().to_str() {
                Some(name) => names.push(name.to_string()),
                None => debug!("Skipping non UTF-8 file name: {:?}", entry.path()),
            }
        }

        names.sort();
        Ok(names)
    }

    fn blob_size(&self, name: &str) -> Result<u64> {
        let path = self.blob_path(name)?;
        let meta = std::fs::metadata(&path).map_err(|e| not_found_or_io(e, name))?;
        Ok(meta.len())
    }

    fn download_range(&self, name: &str, offset: u64, length: Option<u64>) -> Result<Bytes> {
        let mut file = self.open(name)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = Vec::new();
        match length {
            Some(len) => {
                file.take(len).read_to_end(&mut buf)?;
            }
            None => {
                file.read_to_end(&mut buf)?;
            }
        }
        Ok(Bytes::from(buf))
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.blob_path(name)?.is_file())
    }

    fn upload(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.blob_path(name)?;
        std::fs::write(&path, data)?;
        debug!("Wrote {} bytes to {:?}", data.len(), path);
        Ok(())
    }
}
