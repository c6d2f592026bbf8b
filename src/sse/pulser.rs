//! Keep-alive pulser.
//!
//! A background task that queues a comment frame every `interval` so that
//! intermediaries do not close an idle stream. It writes nothing else and
//! stops as soon as its token is cancelled or the client is gone.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::sse::frame::keep_alive_frame;
use crate::sse::session::SessionGuard;
use crate::sse::sink::{FrameSink, Offer};

/// Why the pulser stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseEnd {
    Cancelled,
    ClientGone,
}

/// Run the pulse loop. The first pulse fires one full interval after start.
///
/// `_guard` is held for the lifetime of the loop so the session tracker sees
/// the pulser exactly as long as it runs.
pub async fn run(
    interval: Duration,
    sink: FrameSink,
    cancel: CancellationToken,
    _guard: SessionGuard,
) -> PulseEnd {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PulseEnd::Cancelled,
            _ = sink.closed() => return PulseEnd::ClientGone,
            _ = ticker.tick() => {
                match sink.offer(keep_alive_frame()) {
                    Offer::Queued => tracing::trace!("keep-alive queued"),
                    // Frames are already waiting, the connection is not idle.
                    Offer::Full => tracing::trace!("keep-alive skipped, sink full"),
                    Offer::Closed => return PulseEnd::ClientGone,
                }
            }
        }
    }
}
