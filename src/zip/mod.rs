//! ZIP archive indexing and entry extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: on-disk records (EOCD, ZIP64 EOCD, central directory constants)
//!   and the decoded [`ArchiveEntry`] descriptor
//! - [`parser`]: low-level parsing of those records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`index`]: the name-addressable [`ArchiveIndex`] with last-wins duplicate handling
//! - `extractor`: full-entry and byte-window reads on top of an index
//!
//! The EOCD is read first (from the end of the file), then the central
//! directory, so listing an archive never touches entry bodies.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED entries with true random access
//! - DEFLATE entries, inflated sequentially from their start
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods
//! - Read-only

mod extractor;
mod index;
mod parser;
mod structures;

pub use index::ArchiveIndex;
pub use parser::ZipParser;
pub use structures::*;
