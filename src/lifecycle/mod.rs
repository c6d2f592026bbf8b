//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build server → Start watcher → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → token cancelled → open streams end
//!     → axum stops accepting and drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - One cancellation token tree for the whole process
//! - Streams are cancelled before draining; an open SSE response would
//!   otherwise hold graceful shutdown forever

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
