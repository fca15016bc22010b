//! Ismforge-Common: Shared types, file classification, and language tables.
//!
//! This crate provides common functionality used across ismforge:
//!
//! - **Core Types**: [`TrackType`] shared by the parser and manifest writers
//! - **Formats**: Blob classification by extension and asset key derivation
//! - **Languages**: ISO 639 lookups, display names and file-name scanning
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use ismforge_common::formats::{blob_key, MediaFormat};
//! use ismforge_common::language;
//! use ismforge_common::{Error, Result, TrackType};
//!
//! assert!(MediaFormat::from_name("movie.ismv").unwrap().is_media());
//! assert_eq!(blob_key("movie_2.mpi").as_deref(), Some("movie"));
//! assert_eq!(language::resolve("ger").1, "German");
//! assert_eq!(TrackType::Audio.to_string(), "audio");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("movie.mp4"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod formats;
pub mod language;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
