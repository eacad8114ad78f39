//! Range-aware streaming of single entries out of posterpack archives.
//!
//! Implements the entry-streaming HTTP contract without depending on a web
//! framework: callers hand over the `zip` and `entry` query values and the
//! raw `Range` header and get back a status, headers and a chunked body.
//!
//! | Outcome                    | Status |
//! |----------------------------|--------|
//! | whole entry                | 200    |
//! | satisfiable single range   | 206    |
//! | range start past the entry | 416    |
//! | archive or entry missing   | 404    |

mod range;
mod streamer;

pub use range::{ByteRange, RangeWindow};
pub use streamer::{
    BODY_CHUNK, EntryBody, EntryResponse, EntryStreamer, content_type_for, stream_entry,
};
