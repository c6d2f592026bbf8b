//! Non-streaming forwarding.
//!
//! # Responsibilities
//! - Plain endpoints: first backend target, response passed through verbatim
//! - Unmatched requests: forwarded to the configured fallback host
//!
//! # Design Decisions
//! - Bodies are never buffered in either direction
//! - Upstream statuses are passed through unchanged, including 4xx and 5xx
//! - Nothing is retried

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::{EndpointConfig, FallbackConfig};
use crate::http::client::UpstreamClient;
use crate::http::request::copy_client_headers;
use crate::http::response::{json_error, passthrough};
use crate::sse::connector::{build_backend_request, first_target, ConnectError};

/// Forward a request for a non-SSE endpoint to its first backend.
pub async fn forward_endpoint(
    client: &UpstreamClient,
    endpoint: &EndpointConfig,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    let upstream = match first_target(&endpoint.backend)
        .and_then(|target| build_backend_request(target, &parts, body))
    {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(endpoint = %endpoint.endpoint, error = %e, "Failed to build backend request");
            return e.into_response();
        }
    };

    match client.send(upstream).await {
        Ok(response) => passthrough(response),
        Err(e) => {
            tracing::error!(endpoint = %endpoint.endpoint, error = %e, "Backend request failed");
            ConnectError::from(e).into_response()
        }
    }
}

/// Target URI for an unmatched request: fallback origin plus the original
/// path and query.
pub fn fallback_uri(fallback: &FallbackConfig, request: &Request<Body>) -> String {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{}://{}{}", fallback.scheme, fallback.host, path_and_query)
}

/// Forward an unmatched request to the fallback host.
pub async fn forward_fallback(
    client: &UpstreamClient,
    fallback: &FallbackConfig,
    request: Request<Body>,
) -> Response {
    let uri = fallback_uri(fallback, &request);
    let (parts, body) = request.into_parts();

    let mut builder = Request::builder().method(parts.method.clone()).uri(&uri);
    if let Some(headers) = builder.headers_mut() {
        copy_client_headers(&parts.headers, headers);
    }

    let upstream = match builder.body(body) {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(uri = %uri, error = %e, "Failed to create fallback request");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create request");
        }
    };

    tracing::debug!(uri = %uri, method = %parts.method, "Forwarding to fallback");

    match client.send(upstream).await {
        Ok(response) => passthrough(response),
        Err(e) => {
            tracing::error!(uri = %uri, error = %e, "Fallback request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to forward request")
        }
    }
}
