//! Endpoint lookup.
//!
//! # Design Decisions
//! - Immutable after construction; a config reload builds a new table
//! - O(n) scan over endpoints ordered by specificity (acceptable for typical
//!   endpoint counts)
//! - A path that exists under another method is reported, not hidden

use std::sync::Arc;

use axum::http::Method;

use crate::config::EndpointConfig;
use crate::routing::matcher::PathPattern;

#[derive(Debug)]
struct Entry {
    method: Method,
    pattern: PathPattern,
    endpoint: Arc<EndpointConfig>,
}

/// Result of an endpoint lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Arc<EndpointConfig>),
    MethodNotAllowed,
    NoMatch,
}

/// Compiled endpoint table.
#[derive(Debug, Default)]
pub struct EndpointTable {
    entries: Vec<Entry>,
}

impl EndpointTable {
    /// Compile the table. Endpoints with an unparsable method are skipped.
    pub fn from_config(endpoints: &[EndpointConfig]) -> Self {
        let mut entries: Vec<Entry> = endpoints
            .iter()
            .filter_map(|endpoint| {
                let method = match Method::from_bytes(endpoint.method.to_ascii_uppercase().as_bytes()) {
                    Ok(method) => method,
                    Err(_) => {
                        tracing::warn!(endpoint = %endpoint.endpoint, method = %endpoint.method, "Skipping endpoint with invalid method");
                        return None;
                    }
                };
                Some(Entry {
                    method,
                    pattern: PathPattern::new(&endpoint.endpoint),
                    endpoint: Arc::new(endpoint.clone()),
                })
            })
            .collect();

        // Stable: equally specific patterns keep declaration order.
        entries.sort_by(|a, b| b.pattern.specificity().cmp(&a.pattern.specificity()));

        tracing::debug!(endpoints = entries.len(), "Endpoint table compiled");
        Self { entries }
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let mut path_matched = false;
        for entry in &self.entries {
            if !entry.pattern.matches(path) {
                continue;
            }
            if entry.method == method {
                return Lookup::Found(entry.endpoint.clone());
            }
            path_matched = true;
        }

        if path_matched {
            Lookup::MethodNotAllowed
        } else {
            Lookup::NoMatch
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
