//! Movie fragment aggregation.
//!
//! Every `traf` of every `moof` contributes one fragment (duration and byte
//! size) to the track named by its `tfhd`.

use crate::mp4::{BoxNode, BoxType, TrackExtends, TrackFragmentHeader, TrackRun};
use crate::track::ChunkList;
use crate::{Error, Result};
use std::collections::BTreeMap;
use tracing::trace;

/// Per-track fragment durations (media ticks) and sizes (bytes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoofFragment {
    pub durations: Vec<u64>,
    pub sizes: Vec<u64>,
}

impl MoofFragment {
    pub fn total_size(&self) -> u64 {
        self.sizes.iter().sum()
    }

    /// Fragment durations as manifest chunks.
    pub fn chunk_list(&self, timescale: u32) -> ChunkList {
        ChunkList::new(timescale, self.durations.clone())
    }
}

/// Collect fragment durations and sizes per track ID.
///
/// Durations come from the `trex` default when it applies to the track and
/// is non-zero, then from the `tfhd` default, then from the `trun` samples.
/// Sizes use the `trex` default or the `trun` samples; `tfhd` default sizes
/// are not consulted.
pub fn aggregate_fragments(
    moofs: &[BoxNode],
    defaults: Option<&TrackExtends>,
) -> Result<BTreeMap<u32, MoofFragment>> {
    let mut fragments: BTreeMap<u32, MoofFragment> = BTreeMap::new();

    for moof in moofs {
        for traf in moof.find_all(BoxType::TRAF) {
            let tfhd = traf
                .child(BoxType::TFHD)
                .ok_or(Error::MissingRequiredBox("tfhd"))?;
            let tfhd = TrackFragmentHeader::parse(&tfhd.payload)?;

            let truns = traf
                .children_of(BoxType::TRUN)
                .map(|trun| TrackRun::parse(&trun.payload))
                .collect::<Result<Vec<_>>>()?;
            if truns.is_empty() {
                return Err(Error::MissingRequiredBox("trun"));
            }

            let trex = defaults.filter(|trex| trex.track_id == tfhd.track_id);
            let trex_duration = trex
                .map(|t| t.default_sample_duration)
                .filter(|&d| d != 0);
            let tfhd_duration = tfhd.default_sample_duration.filter(|&d| d != 0);
            let trex_size = trex.map(|t| t.default_sample_size).filter(|&s| s != 0);

            let mut duration = 0u64;
            let mut size = 0u64;
            for trun in &truns {
                let count = trun.sample_count as u64;
                duration += match trex_duration.or(tfhd_duration) {
                    Some(default) => default as u64 * count,
                    None => trun.total_duration(),
                };
                size += match trex_size {
                    Some(default) => default as u64 * count,
                    None => trun.total_size(),
                };
            }

            trace!(track_id = tfhd.track_id, duration, size, "Fragment");
            let fragment = fragments.entry(tfhd.track_id).or_default();
            fragment.durations.push(duration);
            fragment.sizes.push(size);
        }
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::parse_boxes;
    use crate::testing::{moof, tfhd, traf, trun};
    use assert_matches::assert_matches;
    use bytes::Bytes;

    fn moofs(data: Vec<Vec<u8>>) -> Vec<BoxNode> {
        parse_boxes(Bytes::from(data.concat())).unwrap()
    }

    #[test]
    fn test_trun_sample_values() {
        let boxes = moofs(vec![
            moof(1, &[traf(tfhd(1, None, None), trun(3, &[1000, 1000, 1001], &[10, 20, 30]))]),
            moof(2, &[traf(tfhd(1, None, None), trun(2, &[1000, 1000], &[5, 5]))]),
        ]);
        let fragments = aggregate_fragments(&boxes, None).unwrap();
        assert_eq!(
            fragments[&1],
            MoofFragment {
                durations: vec![3001, 2000],
                sizes: vec![60, 10]
            }
        );
        assert_eq!(fragments[&1].total_size(), 70);
    }

    #[test]
    fn test_trex_defaults_win() {
        let trex = TrackExtends {
            track_id: 1,
            default_sample_duration: 512,
            default_sample_size: 4,
        };
        let boxes = moofs(vec![moof(
            1,
            &[traf(tfhd(1, Some(1024), None), trun(10, &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1], &[100; 10]))],
        )]);
        let fragments = aggregate_fragments(&boxes, Some(&trex)).unwrap();
        assert_eq!(fragments[&1].durations, vec![5120]);
        assert_eq!(fragments[&1].sizes, vec![40]);
    }

    #[test]
    fn test_tfhd_duration_but_not_size() {
        // trex belongs to another track, so tfhd supplies the duration; the
        // tfhd default size is ignored and trun sizes are summed
        let trex = TrackExtends {
            track_id: 9,
            default_sample_duration: 512,
            default_sample_size: 4,
        };
        let boxes = moofs(vec![moof(
            1,
            &[traf(tfhd(2, Some(1024), Some(999)), trun(2, &[], &[300, 200]))],
        )]);
        let fragments = aggregate_fragments(&boxes, Some(&trex)).unwrap();
        assert_eq!(fragments[&2].durations, vec![2048]);
        assert_eq!(fragments[&2].sizes, vec![500]);
    }

    #[test]
    fn test_zero_trex_default_falls_through() {
        let trex = TrackExtends {
            track_id: 1,
            default_sample_duration: 0,
            default_sample_size: 0,
        };
        let boxes = moofs(vec![moof(1, &[traf(tfhd(1, None, None), trun(2, &[400, 600], &[1, 2]))])]);
        let fragments = aggregate_fragments(&boxes, Some(&trex)).unwrap();
        assert_eq!(fragments[&1].durations, vec![1000]);
        assert_eq!(fragments[&1].sizes, vec![3]);
    }

    #[test]
    fn test_multiple_tracks_per_moof() {
        let boxes = moofs(vec![moof(
            1,
            &[
                traf(tfhd(1, Some(3000), None), trun(2, &[], &[1, 1])),
                traf(tfhd(2, Some(1024), None), trun(3, &[], &[2, 2, 2])),
            ],
        )]);
        let fragments = aggregate_fragments(&boxes, None).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[&1].durations, vec![6000]);
        assert_eq!(fragments[&2].durations, vec![3072]);
        assert_eq!(
            fragments[&2].chunk_list(48_000),
            ChunkList::new(48_000, vec![3072])
        );
    }

    #[test]
    fn test_traf_without_tfhd() {
        let boxes = moofs(vec![crate::testing::container(
            b"moof",
            &[crate::testing::container(b"traf", &[trun(1, &[1], &[1])])],
        )]);
        assert_matches!(
            aggregate_fragments(&boxes, None),
            Err(Error::MissingRequiredBox("tfhd"))
        );
    }
}
