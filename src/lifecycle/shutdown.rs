//! Shutdown coordination for the gateway.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Holds the process-wide cancellation token. Long-running tasks take a child
/// token from [`Shutdown::subscribe`]; every SSE session token descends from
/// it, so triggering shutdown also ends every open stream.
#[derive(Debug, Clone)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A token cancelled when shutdown is triggered.
    pub fn subscribe(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_observe_trigger() {
        let shutdown = Shutdown::new();
        let a = shutdown.subscribe();
        let b = shutdown.subscribe();
        assert!(!a.is_cancelled());

        shutdown.trigger();
        a.cancelled().await;
        b.cancelled().await;
        assert!(shutdown.subscribe().is_cancelled());
    }

    #[test]
    fn cancelling_a_subscriber_does_not_trigger() {
        let shutdown = Shutdown::new();
        let early = shutdown.subscribe();
        early.cancel();
        assert!(!shutdown.subscribe().is_cancelled());
    }
}
