//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → per-request spans (tower-http TraceLayer) carrying x-request-id
//!
//! Consumers:
//!     → logging.rs installs the fmt subscriber (stdout)
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings
//! - Request ID flows from the edge into backend requests
//! - Client disconnects are logged at debug, never as errors

pub mod logging;

pub use logging::init_logging;
