//! Backend connector.
//!
//! Turns the client's request into the upstream request for the endpoint's
//! first backend target and waits for the response head. Everything that can
//! go wrong here happens before the client has seen a byte, so every failure
//! maps to a status code.

use axum::body::Body;
use axum::http::{request::Parts, Method, Request, Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use thiserror::Error;

use crate::config::BackendTarget;
use crate::http::client::{UpstreamClient, UpstreamError};
use crate::http::request::copy_client_headers;

/// Failure to obtain a streamable backend response.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("no backend configured for endpoint")]
    NoBackend,

    #[error("no host configured for backend")]
    NoHost,

    #[error("failed to build backend request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("backend request failed: {0}")]
    Transport(#[from] UpstreamError),

    #[error("backend returned non-200 status: {0}")]
    Status(StatusCode),
}

impl ConnectError {
    /// Status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ConnectError::Status(status) => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConnectError {
    fn into_response(self) -> axum::response::Response {
        self.status().into_response()
    }
}

/// Absolute backend URL: host and pattern concatenated as configured.
pub fn backend_url(target: &BackendTarget) -> Result<String, ConnectError> {
    let host = target.primary_host().ok_or(ConnectError::NoHost)?;
    Ok(format!("{}{}", host, target.url_pattern))
}

/// Select the target used for a request: the first one, if any.
pub fn first_target(backends: &[BackendTarget]) -> Result<&BackendTarget, ConnectError> {
    backends.first().ok_or(ConnectError::NoBackend)
}

/// Build the upstream request.
///
/// Client headers are copied verbatim except `Host`, which the client derives
/// from the backend URL. The target's method wins; an empty one keeps the
/// client's.
pub fn build_backend_request(
    target: &BackendTarget,
    parts: &Parts,
    body: Body,
) -> Result<Request<Body>, ConnectError> {
    let url = backend_url(target)?;
    let method = if target.method.is_empty() {
        parts.method.clone()
    } else {
        Method::from_bytes(target.method.to_ascii_uppercase().as_bytes())
            .map_err(axum::http::Error::from)?
    };

    let mut builder = Request::builder().method(method).uri(url);
    if let Some(headers) = builder.headers_mut() {
        copy_client_headers(&parts.headers, headers);
    }

    Ok(builder.body(body)?)
}

/// Open the backend stream for an SSE endpoint.
///
/// Only an exact `200 OK` is accepted; any other status is returned as
/// [`ConnectError::Status`] without reading the body.
pub async fn connect(
    client: &UpstreamClient,
    backends: &[BackendTarget],
    parts: &Parts,
    body: Body,
) -> Result<Response<Incoming>, ConnectError> {
    let target = first_target(backends)?;
    let request = build_backend_request(target, parts, body)?;

    tracing::debug!(url = %request.uri(), method = %request.method(), "SSE backend request");

    let response = client.send(request).await?;
    if response.status() != StatusCode::OK {
        return Err(ConnectError::Status(response.status()));
    }
    Ok(response)
}
