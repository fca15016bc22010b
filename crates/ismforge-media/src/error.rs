//! Error types for ismforge-media.

use std::io;
use thiserror::Error;

/// Result type for ismforge-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for ismforge-media operations.
///
/// Every variant is fatal for the file being parsed; the caller decides
/// whether the rest of the batch continues.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Structural box parse failure (truncation, bad sizes).
    #[error("Malformed box: {0}")]
    MalformedBox(String),

    /// A box or table the track type requires is absent.
    #[error("Missing required box: {0}")]
    MissingRequiredBox(&'static str),

    /// Descriptor layout we refuse to interpret.
    #[error("Unsupported descriptor: {0}")]
    UnsupportedDescriptor(String),

    /// Unsupported feature or codec.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Payload too small for the field being read.
    #[error("Buffer underflow: need {need} bytes, have {have}")]
    BufferUnderflow { need: usize, have: usize },
}

impl Error {
    /// Create a malformed box error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBox(msg.into())
    }

    /// Create an unsupported descriptor error.
    pub fn unsupported_descriptor(msg: impl Into<String>) -> Self {
        Self::UnsupportedDescriptor(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::malformed("moov truncated").to_string(),
            "Malformed box: moov truncated"
        );
        assert_eq!(
            Error::MissingRequiredBox("stss").to_string(),
            "Missing required box: stss"
        );
        assert_eq!(
            Error::BufferUnderflow { need: 8, have: 3 }.to_string(),
            "Buffer underflow: need 8 bytes, have 3"
        );
    }
}
