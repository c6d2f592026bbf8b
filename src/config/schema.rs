//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Opaque per-endpoint extension map. Only the `sse` key is interpreted here.
pub type ExtraConfig = HashMap<String, serde_json::Value>;

/// Key in [`ExtraConfig`] that marks an endpoint as an SSE stream.
pub const SSE_NAMESPACE: &str = "sse";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Shared upstream HTTP client settings.
    pub upstream: UpstreamConfig,

    /// Exposed endpoints and their backends.
    pub endpoints: Vec<EndpointConfig>,

    /// Default backend for requests no endpoint matches.
    pub fallback: Option<FallbackConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Settings for the process-wide upstream client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Idle pooled connections kept per backend host.
    pub pool_max_idle_per_host: usize,

    /// How long an idle pooled connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Frames queued per SSE session before the relay waits on the client.
    pub frame_buffer: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 100,
            pool_idle_timeout_secs: 90,
            frame_buffer: 16,
        }
    }
}

/// One exposed endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Path pattern; `{name}` segments match any single segment.
    pub endpoint: String,

    /// Method the endpoint answers to.
    #[serde(default = "default_method")]
    pub method: String,

    /// Ordered backend targets. Only the first one is used.
    #[serde(default)]
    pub backend: Vec<BackendTarget>,

    /// Extension map; an `sse` entry turns the endpoint into a stream relay.
    #[serde(default)]
    pub extra_config: ExtraConfig,
}

impl EndpointConfig {
    /// Whether requests to this endpoint are relayed as an event stream.
    pub fn is_sse(&self) -> bool {
        self.extra_config.contains_key(SSE_NAMESPACE)
    }
}

fn default_method() -> String {
    "GET".to_string()
}

/// A single backend target of an endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendTarget {
    /// Candidate hosts including scheme (e.g., "http://127.0.0.1:3000").
    #[serde(default)]
    pub host: Vec<String>,

    /// Path appended to the host as-is.
    #[serde(default)]
    pub url_pattern: String,

    /// Method used upstream. Empty means "same as the client".
    #[serde(default)]
    pub method: String,
}

impl BackendTarget {
    /// The host requests are sent to, if one is configured.
    pub fn primary_host(&self) -> Option<&str> {
        self.host.first().map(String::as_str).filter(|h| !h.is_empty())
    }
}

/// Default backend used when no endpoint matches.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackConfig {
    /// "http" or "https".
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Host and optional port (e.g., "legacy.internal:8000").
    pub host: String,
}

fn default_scheme() -> String {
    "http".to_string()
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_endpoint_with_sse_table() {
        let raw = r#"
            [[endpoints]]
            endpoint = "/events"

            [[endpoints.backend]]
            host = ["http://127.0.0.1:8081"]
            url_pattern = "/events"

            [endpoints.extra_config.sse]
            keep_alive_interval = "2s"
            retry_interval = 500
        "#;

        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.endpoints.len(), 1);

        let endpoint = &config.endpoints[0];
        assert_eq!(endpoint.method, "GET");
        assert!(endpoint.is_sse());
        assert_eq!(endpoint.backend[0].primary_host(), Some("http://127.0.0.1:8081"));
        assert_eq!(endpoint.extra_config["sse"]["retry_interval"], 500);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn empty_host_is_not_primary() {
        let target = BackendTarget {
            host: vec![String::new()],
            ..Default::default()
        };
        assert_eq!(target.primary_host(), None);
        assert_eq!(BackendTarget::default().primary_host(), None);
    }
}
