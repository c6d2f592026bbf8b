//! Per-endpoint stream tuning.
//!
//! Values come from the endpoint's `extra_config.sse` entry. Each field is
//! extracted on its own; anything absent, zero, negative or of the wrong shape
//! falls back to its default. A bad tuning value never fails a request.

use std::time::Duration;

use serde_json::Value;

use crate::config::{ExtraConfig, SSE_NAMESPACE};

/// Default period between keep-alive comments.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Default client reconnection hint, in milliseconds.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

/// Default upper bound on a single backend line, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Resolved tuning for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub keep_alive_interval: Duration,
    pub retry_interval_ms: u64,
    pub max_line_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl StreamConfig {
    /// Resolve the stream tuning from an endpoint's extension map.
    pub fn resolve(extra: &ExtraConfig) -> Self {
        let mut config = Self::default();

        let Some(entry) = extra.get(SSE_NAMESPACE).and_then(Value::as_object) else {
            if extra.contains_key(SSE_NAMESPACE) {
                tracing::debug!("sse entry is not a table, using default stream tuning");
            }
            return config;
        };

        match entry.get("keep_alive_interval").map(parse_duration) {
            Some(Some(interval)) if !interval.is_zero() => config.keep_alive_interval = interval,
            Some(_) => tracing::debug!("ignoring unusable keep_alive_interval"),
            None => {}
        }

        match entry.get("retry_interval").map(positive_integer) {
            Some(Some(ms)) => config.retry_interval_ms = ms,
            Some(None) => tracing::debug!("ignoring unusable retry_interval"),
            None => {}
        }

        match entry.get("max_line_bytes").map(positive_integer) {
            Some(Some(bytes)) => {
                config.max_line_bytes = usize::try_from(bytes).unwrap_or(usize::MAX)
            }
            Some(None) => tracing::debug!("ignoring unusable max_line_bytes"),
            None => {}
        }

        config
    }
}

fn positive_integer(value: &Value) -> Option<u64> {
    value.as_u64().filter(|v| *v > 0)
}

/// Decode a duration value.
///
/// Integers are nanoseconds. Strings carry a unit suffix and may be compound
/// ("1m30s"); a bare "0" is accepted as zero.
pub fn parse_duration(value: &Value) -> Option<Duration> {
    match value {
        Value::Number(n) => n.as_u64().map(Duration::from_nanos),
        Value::String(s) => parse_duration_str(s),
        _ => None,
    }
}

fn parse_duration_str(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input == "0" {
        return Some(Duration::ZERO);
    }
    if input.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return None;
        }
        let amount: f64 = rest[..digits_end].parse().ok()?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit: f64 = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_end..];

        total += Duration::from_nanos((amount * nanos_per_unit) as u64);
    }
    Some(total)
}
