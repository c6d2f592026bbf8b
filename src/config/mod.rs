//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps its endpoint table atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Per-endpoint SSE tuning lives in the opaque `extra_config` map and is
//!   resolved per request by `sse::config`, never rejected at load time

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendTarget, EndpointConfig, ExtraConfig, FallbackConfig, GatewayConfig, ListenerConfig,
    ObservabilityConfig, UpstreamConfig, SSE_NAMESPACE,
};
