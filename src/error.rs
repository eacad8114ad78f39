//! Error taxonomy for the posterpack store.
//!
//! Discovery errors are per-archive and never abort a scan; streaming errors
//! are per-request and map onto a fixed HTTP status via [`StoreError::status_code`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested archive does not exist under any configured root.
    #[error("Archive not found: {0}")]
    ArchiveNotFound(PathBuf),

    /// Malformed or truncated ZIP structure.
    #[error("Archive corrupt: {0}")]
    ArchiveCorrupt(String),

    /// The archive has no entry with this name.
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// Range start lies at or beyond the entry length.
    #[error("Range not satisfiable for entry of {total} bytes")]
    RangeNotSatisfiable { total: u64 },

    /// The archive lacks the entries its pack type requires.
    #[error("Classification rejected: {0}")]
    ClassificationRejected(String),

    #[error("Invalid metadata: {0}")]
    Metadata(String),

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl StoreError {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        StoreError::ArchiveCorrupt(message.into())
    }

    /// HTTP status the entry-streaming contract assigns to this error.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::ArchiveNotFound(_) | StoreError::EntryNotFound(_) => 404,
            StoreError::RangeNotSatisfiable { .. } => 416,
            _ => 500,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        // A read running off the end of the file means a truncated structure.
        if err.kind() == io::ErrorKind::UnexpectedEof {
            StoreError::ArchiveCorrupt(format!("truncated archive ({err})"))
        } else {
            StoreError::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_streaming_contract() {
        assert_eq!(StoreError::EntryNotFound("poster.jpg".into()).status_code(), 404);
        assert_eq!(StoreError::ArchiveNotFound("a.zip".into()).status_code(), 404);
        assert_eq!(StoreError::RangeNotSatisfiable { total: 10 }.status_code(), 416);
        assert_eq!(StoreError::corrupt("bad").status_code(), 500);
    }

    #[test]
    fn unexpected_eof_is_corruption() {
        let err: StoreError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, StoreError::ArchiveCorrupt(_)));

        let err: StoreError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
