//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (endpoint lookup)
//!     → matcher.rs (segment-wise pattern match)
//!     → Return: endpoint, method-not-allowed, or no match
//!
//! Table Compilation (startup and every config reload):
//!     EndpointConfig[]
//!     → compile path patterns
//!     → sort by specificity
//!     → freeze as immutable EndpointTable
//! ```
//!
//! # Design Decisions
//! - Deterministic: same input always matches same endpoint
//! - Unmatched requests are not an error here; the server decides whether a
//!   fallback backend takes them

pub mod matcher;
pub mod router;

pub use router::{EndpointTable, Lookup};
