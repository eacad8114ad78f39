#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use posterpack::ReadAt;

/// DOS timestamp 2024-03-15 13:45:30
const DOS_TIME: u16 = (13 << 11) | (45 << 5) | 15;
const DOS_DATE: u16 = ((2024 - 1980) << 9) | (3 << 5) | 15;

/// Minimal ZIP writer for test fixtures.
///
/// Unlike real writers it happily emits duplicate names, which the index
/// tests rely on, and can declare sizes that do not match the payload.
#[derive(Default)]
pub struct ZipBuilder {
    data: Vec<u8>,
    records: Vec<Record>,
    comment: Vec<u8>,
    zip64: bool,
}

/// Central-directory view of one written entry.
struct Record {
    name: String,
    method: u16,
    crc: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    local_header_offset: u64,
    zip64: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write ZIP64 records: saturated header fields, 0x0001 extra fields,
    /// the ZIP64 end record and its locator. Call before adding entries.
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn stored(mut self, name: &str, contents: &[u8]) -> Self {
        self.add(name, 0, contents, contents.to_vec());
        self
    }

    pub fn deflated(mut self, name: &str, contents: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(contents).unwrap();
        let payload = encoder.finish().unwrap();
        self.add(name, 8, contents, payload);
        self
    }

    /// Make the last entry's central record claim `size` compressed bytes,
    /// carried in a ZIP64 extra field.
    pub fn declare_compressed_size(mut self, size: u64) -> Self {
        let record = self.records.last_mut().unwrap();
        record.compressed_size = size;
        record.zip64 = true;
        self
    }

    /// Make the last entry's central record point its local header at `offset`.
    pub fn declare_local_header_offset(mut self, offset: u64) -> Self {
        let record = self.records.last_mut().unwrap();
        record.local_header_offset = offset;
        record.zip64 = true;
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    fn add(&mut self, name: &str, method: u16, contents: &[u8], payload: Vec<u8>) {
        let mut crc = Crc::new();
        crc.update(contents);
        let crc = crc.sum();
        let offset = self.data.len() as u64;

        self.data.extend_from_slice(b"PK\x03\x04");
        put16(&mut self.data, if self.zip64 { 45 } else { 20 });
        put16(&mut self.data, 0);
        put16(&mut self.data, method);
        put16(&mut self.data, DOS_TIME);
        put16(&mut self.data, DOS_DATE);
        put32(&mut self.data, crc);
        if self.zip64 {
            put32(&mut self.data, u32::MAX);
            put32(&mut self.data, u32::MAX);
        } else {
            put32(&mut self.data, payload.len() as u32);
            put32(&mut self.data, contents.len() as u32);
        }
        put16(&mut self.data, name.len() as u16);
        put16(&mut self.data, if self.zip64 { 20 } else { 0 });
        self.data.extend_from_slice(name.as_bytes());
        if self.zip64 {
            put16(&mut self.data, 0x0001);
            put16(&mut self.data, 16);
            put64(&mut self.data, contents.len() as u64);
            put64(&mut self.data, payload.len() as u64);
        }
        self.data.extend_from_slice(&payload);

        self.records.push(Record {
            name: name.to_string(),
            method,
            crc,
            compressed_size: payload.len() as u64,
            uncompressed_size: contents.len() as u64,
            local_header_offset: offset,
            zip64: self.zip64,
        });
    }

    fn write_central(record: &Record, out: &mut Vec<u8>) {
        out.extend_from_slice(b"PK\x01\x02");
        put16(out, if record.zip64 { 45 } else { 20 });
        put16(out, if record.zip64 { 45 } else { 20 });
        put16(out, 0);
        put16(out, record.method);
        put16(out, DOS_TIME);
        put16(out, DOS_DATE);
        put32(out, record.crc);
        if record.zip64 {
            put32(out, u32::MAX);
            put32(out, u32::MAX);
        } else {
            put32(out, record.compressed_size as u32);
            put32(out, record.uncompressed_size as u32);
        }
        put16(out, record.name.len() as u16);
        put16(out, if record.zip64 { 28 } else { 0 });
        put16(out, 0);
        put16(out, 0);
        put16(out, 0);
        put32(out, 0);
        if record.zip64 {
            put32(out, u32::MAX);
        } else {
            put32(out, record.local_header_offset as u32);
        }
        out.extend_from_slice(record.name.as_bytes());
        if record.zip64 {
            put16(out, 0x0001);
            put16(out, 24);
            put64(out, record.uncompressed_size);
            put64(out, record.compressed_size);
            put64(out, record.local_header_offset);
        }
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.data;
        let cd_offset = out.len() as u64;
        let mut central = Vec::new();
        for record in &self.records {
            Self::write_central(record, &mut central);
        }
        out.extend_from_slice(&central);
        let count = self.records.len() as u64;

        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x06\x06");
            put64(&mut out, 44);
            put16(&mut out, 45);
            put16(&mut out, 45);
            put32(&mut out, 0);
            put32(&mut out, 0);
            put64(&mut out, count);
            put64(&mut out, count);
            put64(&mut out, central.len() as u64);
            put64(&mut out, cd_offset);

            out.extend_from_slice(b"PK\x06\x07");
            put32(&mut out, 0);
            put64(&mut out, eocd64_offset);
            put32(&mut out, 1);
        }

        out.extend_from_slice(b"PK\x05\x06");
        put16(&mut out, 0);
        put16(&mut out, 0);
        if self.zip64 {
            put16(&mut out, u16::MAX);
            put16(&mut out, u16::MAX);
            put32(&mut out, u32::MAX);
            put32(&mut out, u32::MAX);
        } else {
            put16(&mut out, count as u16);
            put16(&mut out, count as u16);
            put32(&mut out, central.len() as u32);
            put32(&mut out, cd_offset as u32);
        }
        put16(&mut out, self.comment.len() as u16);
        out.extend_from_slice(&self.comment);
        out
    }

    pub fn write_to(self, path: &Path) -> PathBuf {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, self.finish()).unwrap();
        path.to_path_buf()
    }
}

fn put16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Deterministic non-repeating-looking payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 251) % 256) as u8).collect()
}

/// Motion-pack descriptor from the reference scenario.
pub const MOTION_METADATA: &str = r#"{"packType":"motion","mediaType":"movie","isMotionPoster":true,"title":"My Movie","year":2024}"#;

/// `My Movie (2024)` motion pack with a 1024-byte stored clip.
pub fn motion_pack() -> ZipBuilder {
    ZipBuilder::new()
        .stored("poster.jpg", &payload(300))
        .stored("motion.mp4", &payload(1024))
        .deflated("metadata.json", MOTION_METADATA.as_bytes())
}

/// In-memory archive source that counts the bytes handed out.
pub struct CountingReader {
    data: Vec<u8>,
    read: AtomicU64,
}

impl CountingReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            read: AtomicU64::new(0),
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.read.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.read.store(0, Ordering::Relaxed);
    }
}

#[async_trait]
impl ReadAt for CountingReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        let start = (offset as usize).min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.read.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
