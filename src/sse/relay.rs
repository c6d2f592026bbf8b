//! Stream relayer.
//!
//! Pumps the backend body to the client one line per frame, in backend order.

use axum::body::Body;
use futures_util::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::sse::config::StreamConfig;
use crate::sse::frame::LineFramer;
use crate::sse::sink::FrameSink;

/// A relay that ended abnormally. Headers are already out, so the only
/// remedy is closing the stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("backend read failed: {0}")]
    BackendRead(#[source] axum::Error),

    #[error("backend line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

/// How a relay ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// The backend finished its response.
    BackendEof,
    /// The client disconnected.
    ClientGone,
    /// The session was cancelled from above (process shutdown).
    Cancelled,
}

/// Forward `backend` to `sink` until it ends, fails, or either side goes away.
pub async fn relay(
    backend: Body,
    sink: &FrameSink,
    config: &StreamConfig,
    cancel: &CancellationToken,
) -> Result<RelayEnd, StreamError> {
    let mut chunks = backend.into_data_stream();
    let mut framer = LineFramer::new(config.max_line_bytes);

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(RelayEnd::Cancelled),
            _ = sink.closed() => return Ok(RelayEnd::ClientGone),
            chunk = chunks.next() => chunk,
        };

        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => return Err(StreamError::BackendRead(e)),
            None => {
                if framer.pending() > 0 {
                    tracing::debug!(
                        bytes = framer.pending(),
                        "dropping unterminated trailing line"
                    );
                }
                return Ok(RelayEnd::BackendEof);
            }
        };

        framer.push(&bytes);
        while let Some(line) = framer.next_line()? {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(RelayEnd::Cancelled),
                sent = sink.send(line) => {
                    if sent.is_err() {
                        return Ok(RelayEnd::ClientGone);
                    }
                }
            }
        }
    }
}
