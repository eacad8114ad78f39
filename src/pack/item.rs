use flate2::Crc;
use serde::Serialize;

use super::classify::{ClassifiedPack, MediaType, PackType};

/// Value of [`NormalizedMediaItem::source`].
pub const SOURCE_NAME: &str = "posterpack";

/// Display modes an item may be used in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Usage {
    pub cinema: bool,
    pub wallart: bool,
    pub screensaver: bool,
}

impl Usage {
    /// Motion posters are cinema-only.
    pub const MOTION: Usage = Usage {
        cinema: true,
        wallart: false,
        screensaver: false,
    };

    pub const ALL: Usage = Usage {
        cinema: true,
        wallart: true,
        screensaver: true,
    };

    pub fn for_pack(pack_type: PackType) -> Self {
        match pack_type {
            PackType::Motion => Usage::MOTION,
            PackType::Standard => Usage::ALL,
        }
    }
}

/// A posterpack as handed to the aggregation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMediaItem {
    pub id: String,
    pub key: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<u16>,
    pub poster_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_poster_url: Option<String>,
    pub usage: Usage,
    pub pack_type: PackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    pub genres: Vec<String>,
    pub source: &'static str,
    /// Archive path relative to the root it was found under, `/`-separated.
    pub archive_path: String,
}

impl NormalizedMediaItem {
    /// Build the public item for a classified pack found at `archive_path`.
    ///
    /// The motion URL and the cinema-only usage are derived from the same
    /// pack type, so they can never disagree.
    pub fn from_pack(pack: &ClassifiedPack, archive_path: &str, endpoint: &str) -> Self {
        let id = item_id(archive_path, &pack.title);
        let motion_poster_url = match pack.pack_type {
            PackType::Motion => pack
                .motion_entry
                .as_deref()
                .map(|entry| entry_url(endpoint, archive_path, entry)),
            PackType::Standard => None,
        };

        Self {
            key: id.clone(),
            id,
            media_type: pack.media_type,
            title: pack.title.clone(),
            year: pack.year,
            poster_url: entry_url(endpoint, archive_path, &pack.poster_entry),
            thumbnail_url: pack
                .thumbnail_entry
                .as_deref()
                .map(|entry| entry_url(endpoint, archive_path, entry)),
            motion_poster_url,
            usage: Usage::for_pack(pack.pack_type),
            pack_type: pack.pack_type,
            tagline: pack.tagline.clone(),
            overview: pack.overview.clone(),
            genres: pack.genres.clone(),
            source: SOURCE_NAME,
            archive_path: archive_path.to_string(),
        }
    }
}

/// Locator understood by the entry streamer: `{endpoint}?zip=..&entry=..`.
pub fn entry_url(endpoint: &str, archive_path: &str, entry: &str) -> String {
    format!(
        "{endpoint}?zip={}&entry={}",
        urlencoding::encode(archive_path),
        urlencoding::encode(entry)
    )
}

/// Stable id: CRC-32 of the relative path plus a slug of the title.
pub fn item_id(archive_path: &str, title: &str) -> String {
    let mut crc = Crc::new();
    crc.update(archive_path.as_bytes());
    format!("{SOURCE_NAME}-{:08x}-{}", crc.sum(), slug(title))
}

fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(pack_type: PackType) -> ClassifiedPack {
        ClassifiedPack {
            pack_type,
            media_type: MediaType::Movie,
            title: "My Movie".to_string(),
            year: Some(2024),
            tagline: None,
            overview: None,
            genres: Vec::new(),
            poster_entry: "poster.jpg".to_string(),
            thumbnail_entry: None,
            motion_entry: Some("motion.mp4".to_string()),
        }
    }

    #[test]
    fn motion_items_are_cinema_only() {
        let item = NormalizedMediaItem::from_pack(
            &pack(PackType::Motion),
            "movies/My Movie (2024).zip",
            "/local-posterpack",
        );
        assert_eq!(item.usage, Usage::MOTION);
        assert_eq!(
            item.motion_poster_url.as_deref(),
            Some("/local-posterpack?zip=movies%2FMy%20Movie%20%282024%29.zip&entry=motion.mp4")
        );
    }

    #[test]
    fn standard_items_never_carry_motion_url() {
        let item = NormalizedMediaItem::from_pack(&pack(PackType::Standard), "a.zip", "/p");
        assert_eq!(item.motion_poster_url, None);
        assert_eq!(item.usage, Usage::ALL);
        assert_eq!(item.poster_url, "/p?zip=a.zip&entry=poster.jpg");
    }

    #[test]
    fn id_is_pure_function_of_path_and_title() {
        assert_eq!(item_id("a/b.zip", "Blade Runner"), item_id("a/b.zip", "Blade Runner"));
        assert_ne!(item_id("a/b.zip", "Blade Runner"), item_id("a/c.zip", "Blade Runner"));
        assert!(item_id("a/b.zip", "Blade Runner: 2049!").ends_with("-blade-runner-2049"));
    }

    #[test]
    fn serializes_camel_case() {
        let item = NormalizedMediaItem::from_pack(&pack(PackType::Motion), "m.zip", "/p");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "movie");
        assert_eq!(json["packType"], "motion");
        assert_eq!(json["usage"]["wallart"], false);
        assert!(json.get("motionPosterUrl").is_some());
        assert!(json.get("thumbnailUrl").is_none());
    }
}
