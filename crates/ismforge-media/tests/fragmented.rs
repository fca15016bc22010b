//! Fragmented MP4 extraction tests
//!
//! HEVC video, E-AC-3 audio and TTML text carried in `moof` fragments.

use assert_matches::assert_matches;
use bytes::Bytes;
use ismforge_common::TrackType;
use ismforge_media::mp4::{parse_boxes, BoxNode, BoxType};
use ismforge_media::testing::{self, TrakBuilder};
use ismforge_media::{extract_media, ChunkList, Error, MediaDuration, MediaInfo, TrackRecord};

const DEC3_5_1: [u8; 5] = [0x06, 0x00, 0x20, 0x0F, 0x00];

fn hevc_trak() -> Vec<u8> {
    let hvcc = testing::hvcc(&[
        (32, vec![vec![0x40, 0x01]]),
        (33, vec![vec![0x42, 0x01, 0x01]]),
        (34, vec![vec![0x44, 0x01]]),
    ]);
    TrakBuilder::new(1, b"vide", 1000)
        .sample_entry(testing::hvc1(3840, 2160, &hvcc))
        .table(testing::stts(&[]))
        .build()
}

fn eac3_trak() -> Vec<u8> {
    TrakBuilder::new(2, b"soun", 48_000)
        .language("fre")
        .sample_entry(testing::ec3(2, 48_000, &testing::dec3(&DEC3_5_1)))
        .table(testing::stts(&[]))
        .build()
}

fn ttml_trak() -> Vec<u8> {
    TrakBuilder::new(3, b"subt", 1000)
        .language("eng")
        .sample_entry(testing::stpp())
        .build()
}

fn fragment(sequence: u32) -> Vec<u8> {
    testing::moof(
        sequence,
        &[
            testing::traf(
                testing::tfhd(1, Some(1000), None),
                testing::trun(2, &[], &[30_000, 10_000]),
            ),
            // 62 E-AC-3 frames, durations from trex
            testing::traf(testing::tfhd(2, None, None), testing::trun(62, &[], &[768; 62])),
            testing::traf(testing::tfhd(3, None, None), testing::trun(1, &[2000], &[120])),
        ],
    )
}

fn fragmented_file() -> Vec<u8> {
    fragmented_file_with_mvhd(0)
}

fn fragmented_file_with_mvhd(movie_duration: u32) -> Vec<u8> {
    let mvex = testing::container(
        b"mvex",
        &[
            testing::mehd(4000),
            testing::trex(1, 0, 0),
            testing::trex(2, 1536, 0),
            testing::trex(3, 0, 0),
        ],
    );
    let moov = testing::container(
        b"moov",
        &[testing::mvhd(1000, movie_duration), hevc_trak(), eac3_trak(), ttml_trak(), mvex],
    );
    let mut parts = vec![testing::leaf(b"ftyp", b"iso6\0\0\0\0iso6cmfc"), moov];
    for sequence in 1..=2 {
        parts.push(fragment(sequence));
        parts.push(testing::leaf(b"mdat", &[0; 16]));
    }
    parts.push(testing::container(b"mfra", &[]));
    parts.concat()
}

/// Split a parsed file into its `moov` and `moof` boxes.
fn split(file: Vec<u8>) -> (BoxNode, Vec<BoxNode>) {
    let boxes = parse_boxes(Bytes::from(file)).unwrap();
    let (moofs, rest): (Vec<_>, Vec<_>) = boxes
        .into_iter()
        .partition(|b| b.box_type == BoxType::MOOF);
    let moov = rest
        .into_iter()
        .find(|b| b.box_type == BoxType::MOOV)
        .unwrap();
    (moov, moofs)
}

fn extract(file: Vec<u8>) -> MediaInfo {
    let (moov, moofs) = split(file);
    extract_media(&moov, &moofs, "asset_2160p.ismv").unwrap()
}

fn track(info: &MediaInfo, track_type: TrackType) -> &TrackRecord {
    info.tracks
        .iter()
        .find(|t| t.track_type == track_type)
        .unwrap()
}

#[test]
fn test_mehd_duration() {
    let info = extract(fragmented_file());
    assert_eq!(info.duration, MediaDuration::new(4, 1));
    assert_eq!(info.tracks.len(), 3);
}

#[test]
fn test_fragmented_hevc() {
    let info = extract(fragmented_file());
    let video = track(&info, TrackType::Video);

    assert_eq!(video.four_cc, "HVC1");
    assert_eq!(video.codec_private_data, "00000001420101000000014401");
    assert_eq!(video.chunks, ChunkList::new(1000, vec![2000, 2000]));
    // 80_000 bytes over 4 s
    assert_eq!(video.bit_rate, 160_000);
    assert_eq!((video.width, video.height), (Some(3840), Some(2160)));
}

#[test]
fn test_fragmented_eac3() {
    let info = extract(fragmented_file());
    let audio = track(&info, TrackType::Audio);

    assert_eq!(audio.track_id, 2);
    assert_eq!(audio.four_cc, "EC-3");
    assert_eq!(
        audio.codec_private_data,
        "00063F000000AF87FBA7022DFB42A4D405CD93843BDD0600200F00"
    );
    assert_eq!(audio.channels, Some(6));
    assert_eq!(audio.sampling_rate, Some(48_000));
    assert_eq!(audio.packet_size, Some(768));
    assert_eq!(audio.audio_tag, Some(65534));
    assert_eq!(audio.chunks, ChunkList::new(48_000, vec![95_232, 95_232]));
    assert_eq!(audio.bit_rate, 190_464);
    assert_eq!(audio.language.as_deref(), Some("fre"));
}

#[test]
fn test_fragmented_ttml() {
    let info = extract(fragmented_file());
    let text = track(&info, TrackType::Text);

    assert_eq!(text.four_cc, "IMSC");
    assert_eq!(text.codec_private_data, "");
    assert_eq!(text.chunks, ChunkList::new(1000, vec![2000, 2000]));
    assert_eq!(text.bit_rate, 480);
    assert_eq!(text.language.as_deref(), Some("eng"));
}

#[test]
fn test_moofs_ignored_without_mvex() {
    let (mut moov, moofs) = split(fragmented_file());
    moov.children.retain(|c| c.box_type != BoxType::MVEX);

    // the video track is now static and has no keyframe table
    assert_matches!(
        extract_media(&moov, &moofs, "asset.ismv"),
        Err(Error::MissingRequiredBox("stss"))
    );
}

#[test]
fn test_unknown_text_entry() {
    let trak = TrakBuilder::new(1, b"text", 1000)
        .sample_entry(testing::leaf(b"tx3g", &[0; 8]))
        .build();
    let mvex = testing::container(b"mvex", &[testing::trex(1, 0, 0)]);
    let moov = testing::container(b"moov", &[testing::mvhd(1000, 0), trak, mvex]);
    let (moov, _) = split(moov);
    assert_matches!(
        extract_media(&moov, &[], "asset.cmft"),
        Err(Error::MissingRequiredBox("text sample entry"))
    );
}

#[test]
fn test_bitrate_prefers_movie_duration() {
    let info = extract(fragmented_file_with_mvhd(8000));
    // the asset duration still comes from mehd
    assert_eq!(info.duration, MediaDuration::new(4, 1));
    // 80_000 bytes over the 8 s mvhd duration
    assert_eq!(track(&info, TrackType::Video).bit_rate, 80_000);
    assert_eq!(track(&info, TrackType::Text).bit_rate, 240);
}

/// A fragmented movie holding a single track.
fn single_track_movie(trak: Vec<u8>, track_id: u32) -> BoxNode {
    let mvex = testing::container(b"mvex", &[testing::trex(track_id, 0, 0)]);
    let moov = testing::container(b"moov", &[testing::mvhd(1000, 0), trak, mvex]);
    split(moov).0
}

#[test]
fn test_fragmented_video_without_fragments() {
    let moov = single_track_movie(hevc_trak(), 1);
    assert_matches!(
        extract_media(&moov, &[], "asset.ismv"),
        Err(Error::MissingRequiredBox("moof"))
    );
}

#[test]
fn test_fragmented_audio_without_fragments() {
    let moov = single_track_movie(eac3_trak(), 2);
    assert_matches!(
        extract_media(&moov, &[], "asset.isma"),
        Err(Error::MissingRequiredBox("moof"))
    );
}

#[test]
fn test_fragments_of_another_track_only() {
    let moov = single_track_movie(ttml_trak(), 3);
    let moofs = parse_boxes(Bytes::from(testing::moof(
        1,
        &[testing::traf(testing::tfhd(5, Some(1000), None), testing::trun(1, &[], &[120]))],
    )))
    .unwrap();
    assert_matches!(
        extract_media(&moov, &moofs, "asset_eng.cmft"),
        Err(Error::MissingRequiredBox("moof"))
    );
}
