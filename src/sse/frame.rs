//! SSE wire framing.
//!
//! The gateway never parses events. It only cuts the backend byte stream at
//! `\n` so that every frame handed to the client is a whole line, and it
//! produces the two frames of its own: the `retry:` directive and the
//! keep-alive comment.

use bytes::{Bytes, BytesMut};

use crate::sse::StreamError;

/// Comment frame sent on every keep-alive tick.
pub const KEEP_ALIVE_FRAME: &[u8] = b": keepalive\n\n";

/// The leading reconnection hint.
pub fn retry_frame(retry_interval_ms: u64) -> Bytes {
    Bytes::from(format!("retry: {retry_interval_ms}\n\n"))
}

/// The keep-alive comment as a frame.
pub fn keep_alive_frame() -> Bytes {
    Bytes::from_static(KEEP_ALIVE_FRAME)
}

/// Splits a chunked byte stream into `\n`-terminated lines.
///
/// Lines are returned with their terminator, byte-for-byte as received. A
/// pending line longer than `max_line_bytes` (terminator included) is an
/// error, reported as soon as the buffered prefix exceeds the bound.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    max_line_bytes: usize,
    scanned: usize,
}

impl LineFramer {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_line_bytes,
            scanned: 0,
        }
    }

    /// Append a chunk read from the backend.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Take the next complete line, if one is buffered.
    pub fn next_line(&mut self) -> Result<Option<Bytes>, StreamError> {
        match self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let end = self.scanned + offset + 1;
                self.scanned = 0;
                if end > self.max_line_bytes {
                    return Err(StreamError::LineTooLong {
                        limit: self.max_line_bytes,
                    });
                }
                Ok(Some(self.buf.split_to(end).freeze()))
            }
            None => {
                self.scanned = self.buf.len();
                if self.buf.len() > self.max_line_bytes {
                    return Err(StreamError::LineTooLong {
                        limit: self.max_line_bytes,
                    });
                }
                Ok(None)
            }
        }
    }

    /// Bytes of an unterminated line still held back.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
