//! # posterpack
//!
//! Archive-backed media store for posterpacks: ZIP archives bundling a
//! poster image, an optional thumbnail, an optional motion clip and a
//! `metadata.json` descriptor.
//!
//! The crate covers three jobs:
//!
//! - Indexing an archive's central directory without decompressing anything ([`zip`])
//! - Discovering and classifying posterpacks under a set of directories ([`scan`], [`pack`])
//! - Serving one entry out of an archive with HTTP byte-range semantics ([`stream`])
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use posterpack::{EntryStreamer, Scanner, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StoreConfig {
//!         roots: vec![PathBuf::from("/media/posterpacks")],
//!         ..StoreConfig::default()
//!     };
//!
//!     let scanner = Scanner::new(config.clone());
//!     let report = scanner.scan_all().await;
//!     for item in &report.items {
//!         println!("{} -> {}", item.title, item.poster_url);
//!     }
//!
//!     let streamer = EntryStreamer::from_config(&config);
//!     let response = streamer
//!         .respond("My Movie (2024).zip", "motion.mp4", Some("bytes=0-99"))
//!         .await;
//!     println!("{} {:?}", response.status, response.header("Content-Range"));
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod pack;
pub mod scan;
pub mod stream;
pub mod zip;

pub use cli::Cli;
pub use config::{ConfigError, MediaTypeFilter, StoreConfig};
pub use error::{Result, StoreError};
pub use io::{LocalFileReader, ReadAt};
pub use pack::{ClassifiedPack, MediaType, NormalizedMediaItem, PackType, PosterpackMetadata, Usage};
pub use scan::{ScanReport, ScanWarning, Scanner};
pub use stream::{ByteRange, EntryResponse, EntryStreamer, RangeWindow};
pub use zip::{ArchiveEntry, ArchiveIndex, CompressionMethod};
