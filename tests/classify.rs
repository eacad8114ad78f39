mod common;

use std::sync::Arc;

use common::{CountingReader, ZipBuilder, motion_pack, payload};
use posterpack::pack::{PosterpackMetadata, classify};
use posterpack::{ArchiveIndex, MediaType, PackType, StoreError};

async fn index_of(builder: ZipBuilder) -> ArchiveIndex<CountingReader> {
    ArchiveIndex::from_reader(Arc::new(CountingReader::new(builder.finish())))
        .await
        .unwrap()
}

fn meta(json: &str) -> PosterpackMetadata {
    PosterpackMetadata::from_slice(json.as_bytes()).unwrap()
}

#[tokio::test]
async fn flagged_pack_is_motion() {
    let index = index_of(motion_pack()).await;
    let pack = classify(&index, &meta(common::MOTION_METADATA), "My Movie (2024).zip").unwrap();

    assert_eq!(pack.pack_type, PackType::Motion);
    assert_eq!(pack.media_type, MediaType::Movie);
    assert_eq!(pack.title, "My Movie");
    assert_eq!(pack.year, Some(2024));
    assert_eq!(pack.poster_entry, "poster.jpg");
    assert_eq!(pack.motion_entry.as_deref(), Some("motion.mp4"));
}

#[tokio::test]
async fn video_entry_without_flag_stays_standard() {
    let index = index_of(motion_pack()).await;
    let pack = classify(
        &index,
        &meta(r#"{"title":"Not Motion","year":2024}"#),
        "Not Motion.zip",
    )
    .unwrap();

    assert_eq!(pack.pack_type, PackType::Standard);
    assert_eq!(pack.motion_entry, None);
    assert_eq!(pack.title, "Not Motion");
}

#[tokio::test]
async fn pack_type_field_alone_is_not_enough() {
    let index = index_of(motion_pack()).await;
    let pack = classify(&index, &meta(r#"{"packType":"motion"}"#), "X (2001).zip").unwrap();
    assert_eq!(pack.pack_type, PackType::Standard);
}

#[tokio::test]
async fn unflagged_video_without_poster_is_rejected() {
    let index = index_of(ZipBuilder::new().stored("motion.mp4", &payload(64))).await;
    let result = classify(
        &index,
        &meta(r#"{"title":"Not Motion","year":2024}"#),
        "Not Motion.zip",
    );
    assert!(matches!(result, Err(StoreError::ClassificationRejected(_))));
}

#[tokio::test]
async fn motion_pack_needs_exactly_one_clip() {
    let flagged = meta(r#"{"isMotionPoster":true}"#);

    let none = index_of(ZipBuilder::new().stored("poster.jpg", b"img")).await;
    assert!(matches!(
        classify(&none, &flagged, "A (2020).zip"),
        Err(StoreError::ClassificationRejected(_))
    ));

    let two = index_of(
        ZipBuilder::new()
            .stored("poster.jpg", b"img")
            .stored("motion.mp4", b"a")
            .stored("motion.webm", b"b"),
    )
    .await;
    assert!(matches!(
        classify(&two, &flagged, "A (2020).zip"),
        Err(StoreError::ClassificationRejected(_))
    ));
}

#[tokio::test]
async fn filename_supplies_missing_title_and_year() {
    let index = index_of(ZipBuilder::new().stored("poster.jpg", b"img")).await;
    let pack = classify(&index, &PosterpackMetadata::default(), "Test Movie (2024).zip").unwrap();

    assert_eq!(pack.title, "Test Movie");
    assert_eq!(pack.year, Some(2024));
    assert_eq!(pack.pack_type, PackType::Standard);
}

#[tokio::test]
async fn metadata_wins_over_filename() {
    let index = index_of(ZipBuilder::new().stored("poster.jpg", b"img")).await;
    let pack = classify(
        &index,
        &meta(r#"{"title":"The Real Title","year":"1999","mediaType":"Show","tagline":"  ","genres":["Drama"]}"#),
        "Wrong Name (2024).zip",
    )
    .unwrap();

    assert_eq!(pack.title, "The Real Title");
    assert_eq!(pack.year, Some(1999));
    assert_eq!(pack.media_type, MediaType::Show);
    assert_eq!(pack.tagline, None);
    assert_eq!(pack.genres, vec!["Drama"]);
}

#[tokio::test]
async fn roles_match_nested_and_mixed_case_entries() {
    let index = index_of(
        ZipBuilder::new()
            .stored("Heat/Poster.PNG", b"img")
            .stored("Heat/thumbnail.jpg", b"thumb")
            .stored("Heat/Motion.MP4", b"clip"),
    )
    .await;
    let pack = classify(&index, &meta(r#"{"isMotionPoster":true}"#), "Heat (1995).zip").unwrap();

    assert_eq!(pack.poster_entry, "Heat/Poster.PNG");
    assert_eq!(pack.thumbnail_entry.as_deref(), Some("Heat/thumbnail.jpg"));
    assert_eq!(pack.motion_entry.as_deref(), Some("Heat/Motion.MP4"));
}
