//! Single-range `Range: bytes=...` handling.

use crate::error::{Result, StoreError};

/// A parsed byte-range specifier, not yet bound to an entry length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=start-end`
    Bounded { start: u64, end: u64 },
    /// `bytes=start-`
    From { start: u64 },
    /// `bytes=-len`: the last `len` bytes
    Suffix { len: u64 },
}

impl ByteRange {
    /// Parse a `Range` header value.
    ///
    /// Returns `None` for anything that is not a single well-formed byte
    /// range (other units, lists, `end < start`, garbage); callers ignore
    /// such headers and answer with the full body.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (unit, spec) = header.split_once('=')?;
        if !unit.trim().eq_ignore_ascii_case("bytes") || spec.contains(',') {
            return None;
        }

        let (first, last) = spec.trim().split_once('-')?;
        let (first, last) = (first.trim(), last.trim());

        match (first.is_empty(), last.is_empty()) {
            (true, true) => None,
            (true, false) => Some(ByteRange::Suffix {
                len: last.parse().ok()?,
            }),
            (false, true) => Some(ByteRange::From {
                start: first.parse().ok()?,
            }),
            (false, false) => {
                let start = first.parse().ok()?;
                let end = last.parse().ok()?;
                (end >= start).then_some(ByteRange::Bounded { start, end })
            }
        }
    }

    /// Bind the range to an entry of `total` bytes.
    ///
    /// `end` is clamped to the last byte. A start at or past `total` is
    /// rejected with `RangeNotSatisfiable`, as is an empty suffix and any
    /// range over an empty entry. A suffix longer than the entry covers it
    /// whole rather than failing, as RFC 9110 section 14.1.2 prescribes.
    pub fn resolve(self, total: u64) -> Result<RangeWindow> {
        let unsatisfiable = StoreError::RangeNotSatisfiable { total };
        if total == 0 {
            return Err(unsatisfiable);
        }

        let (start, end) = match self {
            ByteRange::Bounded { start, end } => (start, end.min(total - 1)),
            ByteRange::From { start } => (start, total - 1),
            ByteRange::Suffix { len: 0 } => return Err(unsatisfiable),
            ByteRange::Suffix { len } => (total.saturating_sub(len), total - 1),
        };

        if start >= total {
            return Err(unsatisfiable);
        }
        Ok(RangeWindow { start, end, total })
    }
}

/// Inclusive byte window `[start, end]` of an entry `total` bytes long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl RangeWindow {
    /// Window spanning a whole non-empty entry.
    pub fn full(total: u64) -> Option<Self> {
        (total > 0).then(|| Self {
            start: 0,
            end: total - 1,
            total,
        })
    }

    /// Value for `Content-Length`.
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for `Content-Range`.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}
