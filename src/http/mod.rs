//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, dispatch)
//!     → [routing layer finds the endpoint]
//!     ├─ SSE endpoint   → sse:: session → response.rs (event-stream headers)
//!     ├─ plain endpoint → forward.rs → client.rs → response.rs (pass-through)
//!     └─ no match       → forward.rs (fallback host) or 404
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use client::UpstreamClient;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
