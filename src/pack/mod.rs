//! Posterpack semantics on top of an archive index.
//!
//! A posterpack bundles `poster.*`, an optional `thumbnail.*`, an optional
//! `motion.*` clip and a `metadata.json` descriptor.

mod classify;
mod item;
mod metadata;

pub use classify::{
    ClassifiedPack, MOTION_STEM, MediaType, POSTER_STEM, PackType, THUMBNAIL_STEM, classify,
    parse_title_year,
};
pub use item::{NormalizedMediaItem, SOURCE_NAME, Usage, entry_url, item_id};
pub use metadata::{MAX_METADATA_SIZE, METADATA_ENTRY, PosterpackMetadata};
