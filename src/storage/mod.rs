//! Blob container access.
//!
//! The pipeline only needs a flat namespace of named blobs with ranged reads,
//! so every backend sits behind [`BlobStore`].

mod local;

pub use local::LocalContainer;

use bytes::Bytes;
use ismforge_common::Result;

/// A flat container of named blobs.
pub trait BlobStore: Send + Sync {
    /// Blob names in lexicographic order.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Size of a blob in bytes.
    fn blob_size(&self, name: &str) -> Result<u64>;

    /// Read `length` bytes starting at `offset`, or to the end when `None`.
    ///
    /// Reads past the end are truncated, never padded.
    fn download_range(&self, name: &str, offset: u64, length: Option<u64>) -> Result<Bytes>;

    fn exists(&self, name: &str) -> Result<bool>;

    /// Create or replace a blob.
    fn upload(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Read a whole blob.
    fn download(&self, name: &str) -> Result<Bytes> {
        self.download_range(name, 0, None)
    }
}
