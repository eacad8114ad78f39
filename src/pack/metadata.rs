use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Name of the descriptor entry inside a posterpack.
pub const METADATA_ENTRY: &str = "metadata.json";

/// Descriptors larger than this are not parsed.
pub const MAX_METADATA_SIZE: u64 = 1024 * 1024;

/// Fields read from a pack's `metadata.json`.
///
/// Every field is optional; the classifier fills gaps from the archive's
/// filename. Scalar fields are decoded leniently so a single odd value does
/// not discard the rest of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PosterpackMetadata {
    pub pack_type: Option<String>,
    pub media_type: Option<String>,
    /// Set only by a literal JSON `true`.
    #[serde(deserialize_with = "literal_true")]
    pub is_motion_poster: bool,
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<u16>,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    #[serde(deserialize_with = "lenient_genres")]
    pub genres: Vec<String>,
}

impl PosterpackMetadata {
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|err| StoreError::Metadata(err.to_string()))
    }
}

fn literal_true<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(matches!(Option::<Value>::deserialize(deserializer)?, Some(Value::Bool(true))))
}

fn lenient_year<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u16>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|y| u16::try_from(y).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_genres<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    let genres = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(genres
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect())
}
