use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::io::ReadAt;
use crate::zip::ArchiveIndex;

use super::metadata::PosterpackMetadata;

/// Stem of the static poster entry (`poster.jpg`, `poster.webp`, ...).
pub const POSTER_STEM: &str = "poster";
pub const THUMBNAIL_STEM: &str = "thumbnail";
/// Stem of the motion clip (`motion.mp4`, `motion.webm`, ...).
pub const MOTION_STEM: &str = "motion";

/// Trailing `(YYYY)` year in an archive filename.
static TITLE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.*?)\s*\((?P<year>[0-9]{4})\)\s*$").expect("title/year pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackType {
    Standard,
    Motion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Show,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => f.write_str("movie"),
            MediaType::Show => f.write_str("show"),
        }
    }
}

/// Metadata after defaults are filled and required entries are located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPack {
    pub pack_type: PackType,
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<u16>,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub genres: Vec<String>,
    pub poster_entry: String,
    pub thumbnail_entry: Option<String>,
    /// Present exactly when `pack_type` is [`PackType::Motion`].
    pub motion_entry: Option<String>,
}

/// Classify an indexed posterpack.
///
/// A pack is motion only when the descriptor carries a literal
/// `isMotionPoster: true`; a `motion.*` entry on its own does not count.
/// Fails with `ClassificationRejected` when the entries required for the
/// resulting pack type are missing.
pub fn classify<R: ReadAt>(
    index: &ArchiveIndex<R>,
    metadata: &PosterpackMetadata,
    filename: &str,
) -> Result<ClassifiedPack> {
    let media_type = match metadata.media_type.as_deref().map(str::trim) {
        Some(kind) if kind.eq_ignore_ascii_case("show") => MediaType::Show,
        _ => MediaType::Movie,
    };
    let pack_type = if metadata.is_motion_poster {
        PackType::Motion
    } else {
        PackType::Standard
    };

    let (parsed_title, parsed_year) = parse_title_year(filename);
    let title = non_empty(metadata.title.as_deref()).unwrap_or(parsed_title);
    let year = metadata.year.or(parsed_year);

    let poster_entry = index
        .files_with_stem(POSTER_STEM)
        .next()
        .map(|e| e.name.clone())
        .ok_or_else(|| StoreError::ClassificationRejected(format!("{filename}: no poster entry")))?;

    let thumbnail_entry = index
        .files_with_stem(THUMBNAIL_STEM)
        .next()
        .map(|e| e.name.clone());

    let motion_entry = match pack_type {
        PackType::Standard => None,
        PackType::Motion => {
            let clips: Vec<_> = index.files_with_stem(MOTION_STEM).collect();
            if clips.len() != 1 {
                return Err(StoreError::ClassificationRejected(format!(
                    "{filename}: motion pack needs exactly one motion entry, found {}",
                    clips.len()
                )));
            }
            Some(clips[0].name.clone())
        }
    };

    Ok(ClassifiedPack {
        pack_type,
        media_type,
        title,
        year,
        tagline: non_empty(metadata.tagline.as_deref()),
        overview: non_empty(metadata.overview.as_deref()),
        genres: metadata.genres.clone(),
        poster_entry,
        thumbnail_entry,
        motion_entry,
    })
}

/// Derive `(title, year)` from an archive filename of the form `Title (YYYY).zip`.
///
/// Without a trailing parenthesized year the whole stem becomes the title.
pub fn parse_title_year(filename: &str) -> (String, Option<u16>) {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    if let Some(caps) = TITLE_YEAR.captures(&stem) {
        let title = caps["title"].trim();
        if !title.is_empty() {
            return (title.to_string(), caps["year"].parse().ok());
        }
    }

    (stem.trim().to_string(), None)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
