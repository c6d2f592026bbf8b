//! Server-Sent-Events relay.
//!
//! # Data Flow
//! ```text
//! EndpointConfig.extra_config["sse"]
//!     → config.rs (StreamConfig, defaults per field)
//! client request
//!     → connector.rs (first backend, headers copied, 200 required)
//!     → session.rs (open: retry directive queued first)
//!         ├─ pulser.rs (own task, ": keepalive" every interval)
//!         └─ relay.rs  (backend body → lines → frames)
//!     → sink.rs (bounded frame channel → response body)
//! ```
//!
//! # Design Decisions
//! - The response body is the only writer of the client connection; both
//!   producers queue whole frames, so output never interleaves mid-line
//! - The backend is connected before any SSE header is produced, so setup
//!   failures keep their status codes
//! - Session tokens are children of the process shutdown token; pulser
//!   tokens are children of session tokens
//! - Nothing is retried; reconnecting is the client's job, guided by `retry:`

pub mod config;
pub mod connector;
pub mod frame;
pub mod pulser;
pub mod relay;
pub mod session;
pub mod sink;

pub use config::StreamConfig;
pub use connector::ConnectError;
pub use relay::{RelayEnd, StreamError};
pub use session::{SessionTracker, StreamSession};
