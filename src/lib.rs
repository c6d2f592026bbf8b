//! SSE relay gateway.
//!
//! Accepts client requests, matches them against configured endpoints and
//! either relays a backend Server-Sent-Events stream line by line (with
//! keep-alive comments and a leading `retry:` directive) or forwards the
//! request as-is.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────┐    ┌──────────┐
//!     ─────────────────────▶│   http   │───▶│ routing  │
//!                           │  server  │    │  table   │
//!                           └────┬─────┘    └──────────┘
//!                                │
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//!          ┌─────────────┐               ┌─────────────┐
//!          │ sse session │               │   forward   │
//!          │ relay+pulse │               │ (pass-thru) │
//!          └──────┬──────┘               └──────┬──────┘
//!                 └──────────┬──────────────────┘
//!                            ▼
//!                     ┌─────────────┐
//!                     │ http client │────────▶ Backend
//!                     └─────────────┘
//!
//!     Cross-cutting: config (+ hot reload), lifecycle, observability
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod sse;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
