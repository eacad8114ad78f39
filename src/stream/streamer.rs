use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::io::{LocalFileReader, ReadAt};
use crate::zip::{ArchiveEntry, ArchiveIndex, CompressionMethod};

use super::range::{ByteRange, RangeWindow};

/// Largest chunk handed out by [`EntryBody::next_chunk`].
pub const BODY_CHUNK: usize = 64 * 1024;

/// Serves single archive entries, honouring one `Range` per request.
///
/// Every request opens its own archive handle; nothing is shared between
/// requests.
#[derive(Debug, Clone)]
pub struct EntryStreamer {
    roots: Vec<PathBuf>,
}

impl EntryStreamer {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.roots.clone())
    }

    /// Map a `zip` query value to an archive on disk.
    ///
    /// The value must be a relative path without `..`; the first root that
    /// holds it wins.
    pub async fn resolve_archive(&self, zip: &str) -> Result<PathBuf> {
        let relative = Path::new(zip);
        let well_formed = !zip.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !well_formed {
            return Err(StoreError::ArchiveNotFound(relative.to_path_buf()));
        }

        for root in &self.roots {
            let candidate = root.join(relative);
            if tokio::fs::metadata(&candidate)
                .await
                .is_ok_and(|meta| meta.is_file())
            {
                return Ok(candidate);
            }
        }
        Err(StoreError::ArchiveNotFound(relative.to_path_buf()))
    }

    /// Stream `entry` out of the archive named by `zip`.
    pub async fn stream(&self, zip: &str, entry: &str, range: Option<&str>) -> Result<EntryResponse> {
        let archive = self.resolve_archive(zip).await?;
        stream_entry(&archive, entry, range).await
    }

    /// Like [`stream`](Self::stream), with errors turned into their HTTP responses.
    pub async fn respond(&self, zip: &str, entry: &str, range: Option<&str>) -> EntryResponse {
        match self.stream(zip, entry, range).await {
            Ok(response) => response,
            Err(err) => {
                if err.status_code() >= 500 {
                    warn!(zip, entry, error = %err, "posterpack entry request failed");
                } else {
                    debug!(zip, entry, error = %err, "posterpack entry request rejected");
                }
                EntryResponse::from_error(&err)
            }
        }
    }
}

/// Resolve `entry_name` in the archive at `archive_path` and prepare its response.
///
/// Without a usable range the whole entry is returned with `200`; with one,
/// the resolved window is returned with `206`. Stored entries are read
/// lazily from their offset; deflated entries are inflated up to the end of
/// the window before the response is built.
pub async fn stream_entry(
    archive_path: &Path,
    entry_name: &str,
    range: Option<&str>,
) -> Result<EntryResponse> {
    let index = ArchiveIndex::open(archive_path).await?;
    let entry = index.lookup(entry_name)?;
    if entry.is_directory {
        return Err(StoreError::EntryNotFound(entry_name.to_string()));
    }
    let total = entry.uncompressed_size;

    let range = range.and_then(|header| {
        let parsed = ByteRange::parse(header);
        if parsed.is_none() {
            debug!(header, "ignoring unusable Range header");
        }
        parsed
    });

    let (status, window) = match range {
        None => (200, RangeWindow::full(total)),
        Some(range) => (206, Some(range.resolve(total)?)),
    };

    let body = match window {
        None => EntryBody::empty(),
        Some(window) => {
            debug!(
                archive = %archive_path.display(),
                entry = entry_name,
                start = window.start,
                end = window.end,
                total,
                "serving entry window"
            );
            body_for_window(&index, entry, window, status == 200).await?
        }
    };

    let mut headers = vec![
        ("Content-Type", content_type_for(&entry.name).to_string()),
        ("Accept-Ranges", "bytes".to_string()),
        ("Content-Length", body.len().to_string()),
    ];
    if let (206, Some(window)) = (status, window) {
        headers.push(("Content-Range", window.content_range()));
    }

    Ok(EntryResponse {
        status,
        headers,
        body,
    })
}

async fn body_for_window(
    index: &ArchiveIndex<LocalFileReader>,
    entry: &ArchiveEntry,
    window: RangeWindow,
    whole: bool,
) -> Result<EntryBody> {
    match entry.compression_method {
        CompressionMethod::Stored => {
            let data_offset = index.parser().data_offset(entry).await?;
            Ok(EntryBody::archive(
                Arc::clone(index.reader()),
                data_offset + window.start,
                window.content_length(),
            ))
        }
        CompressionMethod::Deflate if whole => Ok(EntryBody::buffered(index.read_entry(entry).await?)),
        CompressionMethod::Deflate => Ok(EntryBody::buffered(
            index.read_range(entry, window.start, window.end).await?,
        )),
        CompressionMethod::Unknown(method) => Err(StoreError::UnsupportedCompression(method)),
    }
}

/// Status, headers and body for one entry request.
#[derive(Debug)]
pub struct EntryResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: EntryBody,
}

impl EntryResponse {
    /// The bodyless response the streaming contract assigns to `err`.
    pub fn from_error(err: &StoreError) -> Self {
        let mut headers = vec![("Content-Length", "0".to_string())];
        if let StoreError::RangeNotSatisfiable { total } = err {
            headers.push(("Content-Range", format!("bytes */{total}")));
        }
        Self {
            status: err.status_code(),
            headers,
            body: EntryBody::empty(),
        }
    }

    /// First header with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Body of an [`EntryResponse`], produced in chunks of at most [`BODY_CHUNK`] bytes.
///
/// A body reading from the archive holds the file handle until it is
/// exhausted or dropped; dropping it early is how an aborted client
/// cancels the transfer.
#[derive(Debug)]
pub struct EntryBody {
    source: BodySource,
    remaining: u64,
}

enum BodySource {
    Empty,
    Archive {
        reader: Arc<LocalFileReader>,
        offset: u64,
    },
    Buffered {
        data: Vec<u8>,
        pos: usize,
    },
}

impl std::fmt::Debug for BodySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodySource::Empty => f.write_str("Empty"),
            BodySource::Archive { reader, offset } => f
                .debug_struct("Archive")
                .field("path", &reader.path())
                .field("offset", offset)
                .finish(),
            BodySource::Buffered { data, pos } => f
                .debug_struct("Buffered")
                .field("len", &data.len())
                .field("pos", pos)
                .finish(),
        }
    }
}

impl EntryBody {
    pub fn empty() -> Self {
        Self {
            source: BodySource::Empty,
            remaining: 0,
        }
    }

    fn archive(reader: Arc<LocalFileReader>, offset: u64, len: u64) -> Self {
        Self {
            source: BodySource::Archive { reader, offset },
            remaining: len,
        }
    }

    fn buffered(data: Vec<u8>) -> Self {
        Self {
            remaining: data.len() as u64,
            source: BodySource::Buffered { data, pos: 0 },
        }
    }

    /// Bytes not yet handed out.
    pub fn len(&self) -> u64 {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Next chunk of the body, or `None` when it is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.remaining == 0 {
            // Release the archive handle as soon as the last byte is out
            self.source = BodySource::Empty;
            return Ok(None);
        }

        let n = self.remaining.min(BODY_CHUNK as u64) as usize;
        let chunk = match &mut self.source {
            BodySource::Empty => return Ok(None),
            BodySource::Archive { reader, offset } => {
                let mut buf = vec![0u8; n];
                reader.read_exact_at(*offset, &mut buf).await?;
                *offset += n as u64;
                buf
            }
            BodySource::Buffered { data, pos } => {
                let chunk = data[*pos..*pos + n].to_vec();
                *pos += n;
                chunk
            }
        };

        self.remaining -= n as u64;
        Ok(Some(chunk))
    }

    /// Collect the rest of the body.
    pub async fn read_to_end(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.remaining.min(BODY_CHUNK as u64 * 16) as usize);
        while let Some(chunk) = self.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Write the rest of the body to `writer`, returning the bytes written.
    ///
    /// A failed write stops the transfer; the body is dropped and its
    /// handle released.
    pub async fn copy_to<W: AsyncWrite + Unpin>(mut self, writer: &mut W) -> Result<u64> {
        let mut written = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

/// `Content-Type` for an entry, from its extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
