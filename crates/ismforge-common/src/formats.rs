//! File classification by extension.
//!
//! A container holds a mix of media files (progressive or fragmented MP4
//! variants), media index files (`.mpi`, companions of a media file that carry
//! refined fragment data) and subtitle files. Everything else is ignored by
//! the manifest pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognised input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Progressive or fragmented MP4.
    Mp4,
    /// Media index file paired with a primary media file.
    Mpi,
    /// Smooth Streaming video file.
    Ismv,
    /// Smooth Streaming audio file.
    Isma,
    /// CMAF text track (fragmented MP4 carrying subtitles).
    Cmft,
    /// TTML subtitle document.
    Ttml,
    /// WebVTT subtitle document.
    Vtt,
}

const ALL_FORMATS: &[MediaFormat] = &[
    MediaFormat::Mp4,
    MediaFormat::Mpi,
    MediaFormat::Ismv,
    MediaFormat::Isma,
    MediaFormat::Cmft,
    MediaFormat::Ttml,
    MediaFormat::Vtt,
];

impl MediaFormat {
    /// Lowercase file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mpi => "mpi",
            Self::Ismv => "ismv",
            Self::Isma => "isma",
            Self::Cmft => "cmft",
            Self::Ttml => "ttml",
            Self::Vtt => "vtt",
        }
    }

    /// Classify a blob name by its extension (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use ismforge_common::formats::MediaFormat;
    ///
    /// assert_eq!(MediaFormat::from_name("asset_VQ1.MP4"), Some(MediaFormat::Mp4));
    /// assert_eq!(MediaFormat::from_name("asset_1.mpi"), Some(MediaFormat::Mpi));
    /// assert_eq!(MediaFormat::from_name("notes.txt"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        ALL_FORMATS.iter().copied().find(|f| f.extension() == ext)
    }

    /// True for formats parsed as ISO-BMFF media (including index files).
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::Mp4 | Self::Mpi | Self::Ismv | Self::Isma | Self::Cmft
        )
    }

    /// True for standalone subtitle documents.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Ttml | Self::Vtt)
    }

    /// True for media index files.
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Mpi)
    }

    /// FourCC advertised in the client manifest for a standalone subtitle file.
    pub fn subtitle_four_cc(&self) -> Option<&'static str> {
        match self {
            Self::Vtt => Some("WVTT"),
            Self::Ttml => Some("TTML"),
            _ => None,
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Derive the asset key of a blob.
///
/// The key is the name without its extension. Index files are named
/// `<key>_<n>.mpi`, so the numeric suffix is stripped as well; an index file
/// without a numeric suffix has no key.
///
/// # Examples
///
/// ```
/// use ismforge_common::formats::blob_key;
///
/// assert_eq!(blob_key("movie_VQ1.mp4").as_deref(), Some("movie_VQ1"));
/// assert_eq!(blob_key("movie_VQ1_3.mpi").as_deref(), Some("movie_VQ1"));
/// assert_eq!(blob_key("movie_index.mpi"), None);
/// ```
pub fn blob_key(name: &str) -> Option<String> {
    let (stem, _) = name.rsplit_once('.')?;

    if MediaFormat::from_name(name) != Some(MediaFormat::Mpi) {
        return Some(stem.to_string());
    }

    let (key, suffix) = stem.rsplit_once('_')?;
    if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
        Some(key.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(MediaFormat::from_name("a.mp4"), Some(MediaFormat::Mp4));
        assert_eq!(MediaFormat::from_name("a.ismv"), Some(MediaFormat::Ismv));
        assert_eq!(MediaFormat::from_name("a.isma"), Some(MediaFormat::Isma));
        assert_eq!(MediaFormat::from_name("a.cmft"), Some(MediaFormat::Cmft));
        assert_eq!(MediaFormat::from_name("a.ttml"), Some(MediaFormat::Ttml));
        assert_eq!(MediaFormat::from_name("a.vtt"), Some(MediaFormat::Vtt));

        // Case insensitive
        assert_eq!(MediaFormat::from_name("a.VTT"), Some(MediaFormat::Vtt));

        // Unknown or missing extension
        assert_eq!(MediaFormat::from_name("a.ism"), None);
        assert_eq!(MediaFormat::from_name("no_extension"), None);
    }

    #[test]
    fn test_roles() {
        assert!(MediaFormat::Mp4.is_media());
        assert!(MediaFormat::Mpi.is_media());
        assert!(MediaFormat::Mpi.is_index());
        assert!(MediaFormat::Cmft.is_media());
        assert!(!MediaFormat::Cmft.is_text());
        assert!(MediaFormat::Vtt.is_text());
        assert!(!MediaFormat::Vtt.is_media());
    }

    #[test]
    fn test_subtitle_four_cc() {
        assert_eq!(MediaFormat::Vtt.subtitle_four_cc(), Some("WVTT"));
        assert_eq!(MediaFormat::Ttml.subtitle_four_cc(), Some("TTML"));
        assert_eq!(MediaFormat::Mp4.subtitle_four_cc(), None);
    }

    #[test]
    fn test_blob_key() {
        assert_eq!(blob_key("asset.mp4").as_deref(), Some("asset"));
        assert_eq!(blob_key("my.asset.ismv").as_deref(), Some("my.asset"));
        assert_eq!(blob_key("asset_2.mpi").as_deref(), Some("asset"));
        assert_eq!(blob_key("asset_x.mpi"), None);
        assert_eq!(blob_key("asset.mpi"), None);
        assert_eq!(blob_key("asset"), None);
    }
}
