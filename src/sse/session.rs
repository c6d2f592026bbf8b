//! Stream session lifecycle.
//!
//! # Token hierarchy
//! ```text
//! process shutdown token
//!     → session token   (cancelled when the relay returns, by any path)
//!         → pulser token
//! ```
//!
//! The controller runs the relay inline and owns the pulser's join handle.
//! When the relay ends it cancels the pulser and waits for it before giving
//! up its own sink handle, so the response body ends only after both writers
//! are gone and no pulse can follow the last relayed line.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::sse::config::StreamConfig;
use crate::sse::frame::retry_frame;
use crate::sse::pulser;
use crate::sse::relay::{self, RelayEnd, StreamError};
use crate::sse::sink::{frame_channel, FrameSink, FrameStream, Offer};

/// Global counter for session IDs. Only uniqueness matters.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sse-{}", self.0)
    }
}

/// Counts running keep-alive pulsers, one per open session.
///
/// A count that does not return to zero after streams end is a task leak.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    active_count: Arc<AtomicU64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a running pulser. The count drops when the guard does.
    pub fn track(&self) -> SessionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        SessionGuard {
            active_count: Arc::clone(&self.active_count),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Decrements its tracker when dropped.
#[derive(Debug)]
pub struct SessionGuard {
    active_count: Arc<AtomicU64>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One relayed event stream.
#[derive(Debug)]
pub struct StreamSession {
    id: SessionId,
    config: StreamConfig,
    sink: FrameSink,
    token: CancellationToken,
    tracker: SessionTracker,
}

impl StreamSession {
    /// Open a session whose lifetime is bounded by `parent`.
    ///
    /// The `retry:` directive is queued before anything else can write, so it
    /// is always the first frame of the returned stream.
    pub fn open(
        config: StreamConfig,
        frame_buffer: usize,
        parent: &CancellationToken,
        tracker: SessionTracker,
    ) -> (Self, FrameStream) {
        let (sink, frames) = frame_channel(frame_buffer);
        let first = sink.offer(retry_frame(config.retry_interval_ms));
        debug_assert_eq!(first, Offer::Queued);

        let session = Self {
            id: SessionId::new(),
            config,
            sink,
            token: parent.child_token(),
            tracker,
        };
        (session, frames)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Relay `backend` and keep the stream alive until the relay ends.
    pub async fn run(self, backend: Body) -> Result<RelayEnd, StreamError> {
        let StreamSession {
            id,
            config,
            sink,
            token,
            tracker,
        } = self;

        // Cancels the pulser even if this future is dropped mid-relay.
        let _release = token.clone().drop_guard();

        let pulse_token = token.child_token();
        let pulser: JoinHandle<pulser::PulseEnd> = tokio::spawn(
            pulser::run(
                config.keep_alive_interval,
                sink.clone(),
                pulse_token.clone(),
                tracker.track(),
            )
            .in_current_span(),
        );

        tracing::debug!(
            session = %id,
            keep_alive = ?config.keep_alive_interval,
            retry_ms = config.retry_interval_ms,
            "SSE session started"
        );

        let outcome = relay::relay(backend, &sink, &config, &token).await;

        pulse_token.cancel();
        if let Err(e) = pulser.await {
            tracing::warn!(session = %id, error = %e, "keep-alive task failed");
        }

        match &outcome {
            Ok(RelayEnd::BackendEof) => tracing::debug!(session = %id, "backend closed the stream"),
            Ok(RelayEnd::ClientGone) => tracing::debug!(session = %id, "client disconnected"),
            Ok(RelayEnd::Cancelled) => tracing::debug!(session = %id, "stream cancelled"),
            Err(e @ StreamError::LineTooLong { .. }) => {
                tracing::warn!(session = %id, error = %e, "closing stream")
            }
            Err(e) => tracing::error!(session = %id, error = %e, "SSE read error"),
        }

        outcome
    }

    /// Run the session on its own task and return the client-facing body.
    pub fn spawn(self, backend: Body, frames: FrameStream) -> Body {
        tokio::spawn(self.run(backend).in_current_span());
        frames.into_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;
    use std::time::Duration;

    const RETRY: &[u8] = b"retry: 1000\n\n";
    const PULSE: &[u8] = b": keepalive\n\n";

    fn quick(keep_alive_ms: u64) -> StreamConfig {
        StreamConfig {
            keep_alive_interval: Duration::from_millis(keep_alive_ms),
            ..StreamConfig::default()
        }
    }

    /// Backend that yields each chunk after its delay, then ends.
    fn paced(chunks: Vec<(u64, &'static str)>) -> Body {
        let items = stream::unfold(chunks.into_iter(), |mut rest| async move {
            let (delay, chunk) = rest.next()?;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Some((Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes())), rest))
        });
        Body::from_stream(items)
    }

    async fn collect(mut frames: FrameStream) -> Vec<Bytes> {
        let mut out = Vec::new();
        while let Some(frame) = frames.recv().await {
            out.push(frame);
        }
        out
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[tokio::test]
    async fn retry_first_then_lines_in_order() {
        let tracker = SessionTracker::new();
        let (session, frames) = StreamSession::open(
            StreamConfig::default(),
            16,
            &CancellationToken::new(),
            tracker.clone(),
        );
        let backend = paced(vec![
            (0, "id: 1\ndata: a\n\n"),
            (5, "id: 2\n"),
            (5, "data: b\n\n"),
        ]);

        let handle = tokio::spawn(session.run(backend));
        let got = collect(frames).await;

        assert_eq!(handle.await.unwrap().unwrap(), RelayEnd::BackendEof);
        let expected: Vec<&[u8]> = vec![
            RETRY, b"id: 1\n", b"data: a\n", b"\n", b"id: 2\n", b"data: b\n", b"\n",
        ];
        assert_eq!(got, expected);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn silent_backend_gets_well_formed_pulses() {
        let (session, frames) = StreamSession::open(
            quick(100),
            16,
            &CancellationToken::new(),
            SessionTracker::new(),
        );
        let backend = paced(vec![(380, "data: late\n")]);

        let handle = tokio::spawn(session.run(backend));
        let got = collect(frames).await;
        handle.await.unwrap().unwrap();

        assert_eq!(got.first().map(|f| &f[..]), Some(RETRY));
        assert_eq!(got.last().map(|f| &f[..]), Some(&b"data: late\n"[..]));
        let pulses = &got[1..got.len() - 1];
        assert!(pulses.len() >= 3, "expected at least 3 pulses, got {}", pulses.len());
        assert!(pulses.iter().all(|f| &f[..] == PULSE));
    }

    #[tokio::test]
    async fn pulses_interleave_only_at_frame_boundaries() {
        let (session, frames) = StreamSession::open(
            quick(15),
            16,
            &CancellationToken::new(),
            SessionTracker::new(),
        );
        let backend = paced(vec![
            (20, "data: one\n"),
            (20, "\n"),
            (20, "data: two\n\n"),
            (20, "data: three\n\n"),
        ]);

        let handle = tokio::spawn(session.run(backend));
        let got = collect(frames).await;
        handle.await.unwrap().unwrap();

        let data: Vec<&[u8]> = got
            .iter()
            .skip(1)
            .map(|f| &f[..])
            .filter(|f| *f != PULSE)
            .collect();
        let expected: Vec<&[u8]> = vec![
            &b"data: one\n"[..],
            b"\n",
            b"data: two\n",
            b"\n",
            b"data: three\n",
            b"\n",
        ];
        assert_eq!(data, expected);
    }

    #[tokio::test]
    async fn client_disconnect_stops_the_pulser() {
        let tracker = SessionTracker::new();
        let (session, frames) = StreamSession::open(
            quick(10),
            16,
            &CancellationToken::new(),
            tracker.clone(),
        );
        let backend = Body::from_stream(stream::pending::<Result<Bytes, std::io::Error>>());

        let handle = tokio::spawn(session.run(backend));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(tracker.active_count(), 1);

        drop(frames);
        let end = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("session should end after the client leaves")
            .unwrap()
            .unwrap();
        assert_eq!(end, RelayEnd::ClientGone);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn parent_cancellation_ends_the_stream() {
        let shutdown = CancellationToken::new();
        let tracker = SessionTracker::new();
        let (session, frames) =
            StreamSession::open(quick(10), 16, &shutdown, tracker.clone());
        let backend = Body::from_stream(stream::pending::<Result<Bytes, std::io::Error>>());

        let body = session.spawn(backend, frames);
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        let bytes = tokio::time::timeout(
            Duration::from_secs(1),
            axum::body::to_bytes(body, usize::MAX),
        )
        .await
        .expect("body should end on shutdown")
        .unwrap();
        assert!(bytes.starts_with(RETRY));
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn dropping_the_controller_cancels_the_pulser() {
        let tracker = SessionTracker::new();
        let (session, _frames) = StreamSession::open(
            quick(10),
            16,
            &CancellationToken::new(),
            tracker.clone(),
        );
        let backend = Body::from_stream(stream::pending::<Result<Bytes, std::io::Error>>());

        let handle = tokio::spawn(session.run(backend));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(tracker.active_count(), 1);

        handle.abort();
        let _ = handle.await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn oversized_line_closes_the_stream() {
        let config = StreamConfig {
            max_line_bytes: 8,
            ..StreamConfig::default()
        };
        let (session, frames) =
            StreamSession::open(config, 16, &CancellationToken::new(), SessionTracker::new());
        let backend = paced(vec![(0, "ok\n"), (0, "data: way too long\n")]);

        let handle = tokio::spawn(session.run(backend));
        let got = collect(frames).await;

        assert!(matches!(
            handle.await.unwrap(),
            Err(StreamError::LineTooLong { limit: 8 })
        ));
        let expected: Vec<&[u8]> = vec![RETRY, b"ok\n"];
        assert_eq!(got, expected);
    }
}
