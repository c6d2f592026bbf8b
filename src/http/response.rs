//! Response construction.
//!
//! # Responsibilities
//! - Event-stream responses with the headers intermediaries need
//! - Pass-through of upstream responses without buffering
//! - JSON error bodies for the fallback path

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hyper::body::Incoming;

/// Disables response buffering in nginx-style proxies.
pub const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// A `200 OK` event-stream response around `body`.
pub fn event_stream(body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    response
}

/// Stream an upstream response back with its status and headers.
pub fn passthrough(upstream: axum::http::Response<Incoming>) -> Response {
    let (parts, body) = upstream.into_parts();
    Response::from_parts(parts, Body::new(body))
}

/// A JSON `{"error": ...}` body with the given status.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
