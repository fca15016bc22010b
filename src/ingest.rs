//! Fetching the boxes a manifest needs from a remote media file.
//!
//! Media files can be many gigabytes while the metadata lives in a handful
//! of small boxes. Top-level box headers are read with small ranged reads;
//! only `moov` and, for fragmented files, each `moof` are downloaded in full.
//! Everything else (`mdat` in particular) is skipped by its declared size.

use crate::error::BlobError;
use crate::storage::BlobStore;
use bytes::Bytes;
use ismforge_media::mp4::{parse_boxes, BoxHeader, BoxNode, BoxType};
use ismforge_media::Error as MediaError;
use tracing::{debug, trace};

/// The boxes of one media file that describe its tracks.
#[derive(Debug, Clone)]
pub struct MediaSegments {
    pub moov: BoxNode,
    /// Fragment headers in file order; empty for progressive files.
    pub moofs: Vec<BoxNode>,
}

/// A located top-level box.
#[derive(Debug, Clone, Copy)]
struct TopLevelBox {
    box_type: BoxType,
    offset: u64,
    size: u64,
}

/// Walks the top-level boxes of a blob without downloading their payloads.
struct BoxWalker<'a> {
    store: &'a dyn BlobStore,
    name: &'a str,
    blob_size: u64,
    offset: u64,
}

impl<'a> BoxWalker<'a> {
    fn new(store: &'a dyn BlobStore, name: &'a str) -> Result<Self, BlobError> {
        let blob_size = store.blob_size(name)?;
        Ok(Self {
            store,
            name,
            blob_size,
            offset: 0,
        })
    }

    fn next_box(&mut self) -> Result<Option<TopLevelBox>, BlobError> {
        if self.offset >= self.blob_size {
            return Ok(None);
        }

        let head = self.store.download_range(
            self.name,
            self.offset,
            Some(BoxHeader::MAX_LEN as u64),
        )?;
        let header = BoxHeader::parse(&head)?.ok_or_else(|| {
            MediaError::malformed(format!(
                "truncated box header at offset {} of {}",
                self.offset, self.name
            ))
        })?;

        let remaining = self.blob_size - self.offset;
        let size = if header.extends_to_end() {
            remaining
        } else {
            header.size
        };
        if size > remaining {
            return Err(MediaError::malformed(format!(
                "{} box at offset {} declares {} bytes but only {} remain",
                header.box_type, self.offset, size, remaining
            ))
            .into());
        }

        let found = TopLevelBox {
            box_type: header.box_type,
            offset: self.offset,
            size,
        };
        trace!(
            "{} box at offset {} ({} bytes)",
            found.box_type,
            found.offset,
            found.size
        );
        self.offset += size;
        Ok(Some(found))
    }

    fn download(&self, found: TopLevelBox) -> Result<BoxNode, BlobError> {
        let data = self
            .store
            .download_range(self.name, found.offset, Some(found.size))?;
        decode_single(data, found.box_type)
    }
}

fn decode_single(data: Bytes, box_type: BoxType) -> Result<BoxNode, BlobError> {
    parse_boxes(data)?
        .into_iter()
        .next()
        .filter(|node| node.box_type == box_type)
        .ok_or_else(|| {
            MediaError::malformed(format!("{} box changed while downloading", box_type)).into()
        })
}

/// Download the `moov` box and, when the movie is fragmented, every `moof`.
///
/// Fragments are only collected after `moov` has been seen and declares a
/// `mvex`; the walk stops at `mfra` or the end of the blob.
pub fn fetch_media_segments(
    store: &dyn BlobStore,
    name: &str,
) -> Result<MediaSegments, BlobError> {
    let mut walker = BoxWalker::new(store, name)?;

    let moov = loop {
        match walker.next_box()? {
            Some(found) if found.box_type == BoxType::MOOV => break walker.download(found)?,
            Some(_) => continue,
            None => return Err(MediaError::MissingRequiredBox("moov").into()),
        }
    };

    let mut moofs = Vec::new();
    if moov.child(BoxType::MVEX).is_some() {
        while let Some(found) = walker.next_box()? {
            if found.box_type == BoxType::MFRA {
                break;
            }
            if found.box_type == BoxType::MOOF {
                moofs.push(walker.download(found)?);
            }
        }
    }

    debug!("Fetched moov and {} moof boxes from {}", moofs.len(), name);
    Ok(MediaSegments { moov, moofs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalContainer;
    use assert_matches::assert_matches;
    use ismforge_media::testing;
    use tempfile::TempDir;

    fn store_with(name: &str, data: &[u8]) -> (TempDir, LocalContainer) {
        let dir = TempDir::new().unwrap();
        let store = LocalContainer::new(dir.path());
        store.upload(name, data).unwrap();
        (dir, store)
    }

    fn fragmented() -> Vec<u8> {
        let mvex = testing::container(b"mvex", &[testing::trex(1, 0, 0)]);
        let moov = testing::container(b"moov", &[testing::mvhd(1000, 0), mvex]);
        let moof = |seq| {
            testing::moof(
                seq,
                &[testing::traf(
                    testing::tfhd(1, Some(1000), None),
                    testing::trun(1, &[], &[10]),
                )],
            )
        };
        [
            testing::leaf(b"ftyp", b"iso6\0\0\0\0"),
            moov,
            moof(1),
            testing::leaf(b"mdat", &[0; 10]),
            moof(2),
            testing::leaf(b"mdat", &[0; 10]),
            testing::container(b"mfra", &[]),
            moof(3),
        ]
        .concat()
    }

    #[test]
    fn test_fragmented_file() {
        let (_dir, store) = store_with("a.ismv", &fragmented());
        let segments = fetch_media_segments(&store, "a.ismv").unwrap();
        assert_eq!(segments.moov.box_type, BoxType::MOOV);
        // the moof after mfra is never reached
        assert_eq!(segments.moofs.len(), 2);
    }

    #[test]
    fn test_progressive_file_skips_fragments() {
        let file = [
            testing::leaf(b"ftyp", b"isom\0\0\0\0"),
            testing::leaf(b"mdat", &[0; 32]),
            testing::container(b"moov", &[testing::mvhd(1000, 5000)]),
        ]
        .concat();
        let (_dir, store) = store_with("a.mp4", &file);
        let segments = fetch_media_segments(&store, "a.mp4").unwrap();
        assert!(segments.moofs.is_empty());
        assert!(segments.moov.child(BoxType::MVHD).is_some());
    }

    #[test]
    fn test_missing_moov() {
        let file = [
            testing::leaf(b"ftyp", b"isom\0\0\0\0"),
            testing::leaf(b"mdat", &[0; 8]),
        ]
        .concat();
        let (_dir, store) = store_with("a.mp4", &file);
        assert_matches!(
            fetch_media_segments(&store, "a.mp4"),
            Err(BlobError::Media(MediaError::MissingRequiredBox("moov")))
        );
    }

    #[test]
    fn test_box_overruns_blob() {
        let mut file = testing::leaf(b"ftyp", b"isom\0\0\0\0");
        file.extend_from_slice(&[0, 0, 0x10, 0, b'm', b'd', b'a', b't']);
        let (_dir, store) = store_with("a.mp4", &file);
        assert_matches!(
            fetch_media_segments(&store, "a.mp4"),
            Err(BlobError::Media(MediaError::MalformedBox(_)))
        );
    }

    #[test]
    fn test_missing_blob() {
        let dir = TempDir::new().unwrap();
        let store = LocalContainer::new(dir.path());
        assert_matches!(
            fetch_media_segments(&store, "a.mp4"),
            Err(BlobError::Storage(ismforge_common::Error::NotFound(_)))
        );
    }
}
