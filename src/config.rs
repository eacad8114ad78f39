//! Store configuration.
//!
//! Loaded from a JSON document (camelCase keys, every field optional) and
//! then overridden by command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pack::MediaType;

/// Public path the entry streamer is mounted under.
pub const DEFAULT_ENDPOINT: &str = "/local-posterpack";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaTypeFilter {
    #[default]
    All,
    Movie,
    Show,
}

impl MediaTypeFilter {
    pub fn accepts(&self, media_type: MediaType) -> bool {
        match self {
            MediaTypeFilter::All => true,
            MediaTypeFilter::Movie => media_type == MediaType::Movie,
            MediaTypeFilter::Show => media_type == MediaType::Show,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Directories searched for posterpacks, in order.
    pub roots: Vec<PathBuf>,
    pub endpoint: String,
    pub media_type_filter: MediaTypeFilter,
    /// Stop scanning after this many items.
    pub limit: Option<usize>,
    /// Archive file extensions, matched case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            media_type_filter: MediaTypeFilter::All,
            limit: None,
            extensions: vec!["zip".to_string()],
        }
    }
}

impl StoreConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        Ok(())
    }

    /// Whether `path` carries one of the configured archive extensions.
    pub fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No posterpack roots configured")]
    NoRoots,

    #[error("Endpoint must not be empty")]
    EmptyEndpoint,
}
