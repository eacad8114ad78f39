use flate2::{Crc, Decompress, FlushDecompress, Status};

use crate::error::{Result, StoreError};
use crate::io::ReadAt;

use super::index::ArchiveIndex;
use super::structures::{ArchiveEntry, CompressionMethod};

/// Compressed bytes fed to the inflater per read.
const INFLATE_CHUNK: usize = 64 * 1024;

impl<R: ReadAt> ArchiveIndex<R> {
    /// Read a whole entry into memory and verify its CRC-32.
    pub async fn read_entry(&self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let data = match entry.uncompressed_size {
            0 => Vec::new(),
            total => self.read_range(entry, 0, total - 1).await?,
        };

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(StoreError::corrupt(format!(
                "CRC mismatch for {}: expected {:#010x}, computed {:#010x}",
                entry.name,
                entry.crc32,
                crc.sum()
            )));
        }

        Ok(data)
    }

    /// Read the inclusive uncompressed byte window `[start, end]` of an entry.
    ///
    /// Stored entries are read straight from their offset in the archive.
    /// Deflated entries are inflated from the beginning up to `end + 1`
    /// bytes and the leading part is dropped.
    pub async fn read_range(&self, entry: &ArchiveEntry, start: u64, end: u64) -> Result<Vec<u8>> {
        if start > end || end >= entry.uncompressed_size {
            return Err(StoreError::RangeNotSatisfiable {
                total: entry.uncompressed_size,
            });
        }

        let data_offset = self.parser().data_offset(entry).await?;

        match entry.compression_method {
            CompressionMethod::Stored => {
                let mut buf = vec![0u8; (end - start + 1) as usize];
                self.reader()
                    .read_exact_at(data_offset + start, &mut buf)
                    .await?;
                Ok(buf)
            }
            CompressionMethod::Deflate => {
                let mut data = self.inflate_prefix(entry, data_offset, end + 1).await?;
                Ok(data.split_off(start as usize))
            }
            CompressionMethod::Unknown(method) => Err(StoreError::UnsupportedCompression(method)),
        }
    }

    /// Inflate the first `want` uncompressed bytes of a deflated entry.
    async fn inflate_prefix(&self, entry: &ArchiveEntry, data_offset: u64, want: u64) -> Result<Vec<u8>> {
        let mut inflater = Decompress::new(false);
        let mut out: Vec<u8> = Vec::with_capacity(want.min(INFLATE_CHUNK as u64) as usize);
        let mut input = vec![0u8; INFLATE_CHUNK];
        let mut fed = 0u64;

        'feed: while fed < entry.compressed_size && (out.len() as u64) < want {
            let n = (entry.compressed_size - fed).min(INFLATE_CHUNK as u64) as usize;
            self.reader()
                .read_exact_at(data_offset + fed, &mut input[..n])
                .await?;
            fed += n as u64;

            let flush = if fed == entry.compressed_size {
                FlushDecompress::Finish
            } else {
                FlushDecompress::None
            };

            let mut consumed = 0usize;
            loop {
                if out.len() == out.capacity() {
                    out.reserve(INFLATE_CHUNK);
                }
                let before_in = inflater.total_in();
                let before_out = inflater.total_out();

                let status = inflater
                    .decompress_vec(&input[consumed..n], &mut out, flush)
                    .map_err(|err| StoreError::corrupt(format!("inflating {}: {err}", entry.name)))?;
                consumed += (inflater.total_in() - before_in) as usize;

                if status == Status::StreamEnd || out.len() as u64 >= want {
                    break 'feed;
                }

                let progressed =
                    inflater.total_in() != before_in || inflater.total_out() != before_out;
                if consumed == n && out.len() < out.capacity() {
                    // Everything fed was used and there is room left: need more input
                    break;
                }
                if !progressed {
                    return Err(StoreError::corrupt(format!(
                        "deflate stream for {} stalled",
                        entry.name
                    )));
                }
            }
        }

        if (out.len() as u64) < want {
            return Err(StoreError::corrupt(format!(
                "{} inflated to {} bytes, expected at least {want}",
                entry.name,
                out.len()
            )));
        }

        out.truncate(want as usize);
        Ok(out)
    }
}
