//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics and returns every
//! problem it finds, not just the first. Backend presence is not checked here:
//! an endpoint without a usable backend answers 500 at request time.

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("endpoint '{0}' must start with '/'")]
    EndpointPath(String),

    #[error("endpoint '{path}' has invalid method '{method}'")]
    EndpointMethod { path: String, method: String },

    #[error("endpoint {method} '{path}' is declared more than once")]
    DuplicateEndpoint { path: String, method: String },

    #[error("upstream.frame_buffer must be greater than zero")]
    FrameBuffer,

    #[error("fallback scheme '{0}' is not supported")]
    FallbackScheme(String),

    #[error("fallback host must not be empty")]
    FallbackHost,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.upstream.frame_buffer == 0 {
        errors.push(ValidationError::FrameBuffer);
    }

    let mut seen = HashSet::new();
    for endpoint in &config.endpoints {
        if !endpoint.endpoint.starts_with('/') {
            errors.push(ValidationError::EndpointPath(endpoint.endpoint.clone()));
        }

        let method = endpoint.method.to_ascii_uppercase();
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::EndpointMethod {
                path: endpoint.endpoint.clone(),
                method: endpoint.method.clone(),
            });
        }

        if !seen.insert((method.clone(), endpoint.endpoint.clone())) {
            errors.push(ValidationError::DuplicateEndpoint {
                path: endpoint.endpoint.clone(),
                method,
            });
        }
    }

    if let Some(fallback) = &config.fallback {
        if !matches!(fallback.scheme.as_str(), "http" | "https") {
            errors.push(ValidationError::FallbackScheme(fallback.scheme.clone()));
        }
        if fallback.host.is_empty() {
            errors.push(ValidationError::FallbackHost);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
