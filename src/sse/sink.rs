//! The client-facing frame channel.
//!
//! Pulser and relayer never touch the response directly. They queue whole
//! frames on a bounded channel whose only consumer is the response body, so
//! the body stream is the single writer of the client connection and frames
//! cannot interleave.

use std::convert::Infallible;

use axum::body::Body;
use bytes::Bytes;
use futures_util::stream;
use tokio::sync::mpsc::{self, error::TrySendError};

/// The receiving side vanished: the client is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Result of a non-blocking frame push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Queued,
    Full,
    Closed,
}

/// Cloneable writer handle onto the client connection.
#[derive(Debug, Clone)]
pub struct FrameSink {
    tx: mpsc::Sender<Bytes>,
}

impl FrameSink {
    /// Queue a frame, waiting for room.
    pub async fn send(&self, frame: Bytes) -> Result<(), SinkClosed> {
        self.tx.send(frame).await.map_err(|_| SinkClosed)
    }

    /// Queue a frame only if there is room right now.
    pub fn offer(&self, frame: Bytes) -> Offer {
        match self.tx.try_send(frame) {
            Ok(()) => Offer::Queued,
            Err(TrySendError::Full(_)) => Offer::Full,
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }

    /// Resolves once the client side has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

/// The consuming side; turned into the response body.
#[derive(Debug)]
pub struct FrameStream {
    rx: mpsc::Receiver<Bytes>,
}

impl FrameStream {
    /// Body that yields each queued frame as its own chunk and ends once every
    /// sink handle has been dropped.
    pub fn into_body(self) -> Body {
        let mut rx = self.rx;
        Body::from_stream(stream::poll_fn(move |cx| {
            rx.poll_recv(cx).map(|frame| frame.map(Ok::<_, Infallible>))
        }))
    }

    /// Receive the next frame directly, bypassing the body.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

/// Create a frame channel holding at most `capacity` queued frames.
pub fn frame_channel(capacity: usize) -> (FrameSink, FrameStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (FrameSink { tx }, FrameStream { rx })
}
