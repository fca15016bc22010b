//! Per-file failure type.

use thiserror::Error;

/// Why a single blob could not be processed.
///
/// The pipeline logs these and carries on with the rest of the container.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error(transparent)]
    Storage(#[from] ismforge_common::Error),

    #[error(transparent)]
    Media(#[from] ismforge_media::Error),
}
