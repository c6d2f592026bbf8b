//! Shared upstream HTTP client.
//!
//! One instance is built at startup from `[upstream]` and handed to every
//! handler through application state. It pools connections across requests
//! and holds no per-request state.
//!
//! Both `http://` and `https://` backends are reachable; TLS uses rustls with
//! the webpki root store.
//!
//! No connect, read or write timeout is configured: event streams are
//! open-ended, and a client disconnect (which drops the in-flight request
//! future) is the only thing that ends an upstream call early.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::config::UpstreamConfig;

/// Error returned when an upstream exchange fails before a response arrives.
pub type UpstreamError = hyper_util::client::legacy::Error;

#[derive(Clone, Debug)]
pub struct UpstreamClient {
    inner: Client<HttpsConnector<HttpConnector>, Body>,
}

impl UpstreamClient {
    /// Build a pooled client.
    pub fn new(config: &UpstreamConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(None);
        connector.set_nodelay(true);
        connector.enforce_http(false);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let inner = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build(connector);

        Self { inner }
    }

    /// Send a request and wait for the response head.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Incoming>, UpstreamError> {
        self.inner.request(request).await
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new(&UpstreamConfig::default())
    }
}
