//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the client sent none
//! - Copy client headers onto upstream requests
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The ID is set before forwarding, so backends receive it as an ordinary
//!   client header

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID of a request, or "unknown".
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Copy every client header onto an upstream request except `Host`, which
/// the upstream client derives from the target URI.
pub fn copy_client_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from.iter() {
        if name != header::HOST {
            to.append(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_uuid_ids() {
        let request = Request::new(());
        let id = UuidRequestId.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }

    #[test]
    fn reads_request_id_header() {
        let request = Request::builder()
            .header(X_REQUEST_ID, "abc-123")
            .body(())
            .unwrap();
        assert_eq!(request_id(&request), "abc-123");
        assert_eq!(request_id(&Request::new(())), "unknown");
    }

    #[test]
    fn copies_multi_valued_headers_without_host() {
        let mut from = HeaderMap::new();
        from.insert(header::HOST, HeaderValue::from_static("gateway"));
        from.append("accept", HeaderValue::from_static("text/event-stream"));
        from.append("x-tag", HeaderValue::from_static("a"));
        from.append("x-tag", HeaderValue::from_static("b"));

        let mut to = HeaderMap::new();
        copy_client_headers(&from, &mut to);

        assert!(to.get(header::HOST).is_none());
        assert_eq!(to["accept"], "text/event-stream");
        assert_eq!(to.get_all("x-tag").iter().count(), 2);
    }
}
