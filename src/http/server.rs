//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request ID, tracing)
//! - Dispatch to SSE sessions, plain forwarding or the fallback
//! - Swap routing state on config reload
//! - End open streams on shutdown so draining can finish

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{EndpointConfig, FallbackConfig, GatewayConfig};
use crate::http::client::UpstreamClient;
use crate::http::forward::{forward_endpoint, forward_fallback};
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::response::event_stream;
use crate::routing::{EndpointTable, Lookup};
use crate::sse::connector::{self, ConnectError};
use crate::sse::{SessionTracker, StreamConfig, StreamSession};

/// Routing state replaced as a whole on every reload.
#[derive(Debug)]
pub struct Routes {
    pub endpoints: EndpointTable,
    pub fallback: Option<FallbackConfig>,
}

impl Routes {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            endpoints: EndpointTable::from_config(&config.endpoints),
            fallback: config.fallback.clone(),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<ArcSwap<Routes>>,
    pub client: UpstreamClient,
    pub sessions: SessionTracker,
    /// Process shutdown token, parent of every session token.
    pub shutdown: CancellationToken,
    pub frame_buffer: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    config: GatewayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server with an upstream client built from `[upstream]`.
    ///
    /// Cancelling `shutdown` ends every open stream and starts draining.
    pub fn new(config: GatewayConfig, shutdown: CancellationToken) -> Self {
        let client = UpstreamClient::new(&config.upstream);
        Self::with_client(config, client, shutdown)
    }

    /// Create a server around an existing upstream client.
    pub fn with_client(config: GatewayConfig, client: UpstreamClient, shutdown: CancellationToken) -> Self {
        let state = AppState {
            routes: Arc::new(ArcSwap::from_pointee(Routes::from_config(&config))),
            client,
            sessions: SessionTracker::new(),
            shutdown,
            frame_buffer: config.upstream.frame_buffer.max(1),
        };
        Self { config, state }
    }

    /// Tracker of live stream sessions.
    pub fn sessions(&self) -> SessionTracker {
        self.state.sessions.clone()
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Apply reloaded configs as they arrive.
    ///
    /// Endpoints and the fallback are swapped atomically; requests already
    /// dispatched keep the table they started with. Listener and upstream
    /// settings are only read at startup.
    pub fn spawn_reload(&self, mut updates: mpsc::UnboundedReceiver<GatewayConfig>) -> JoinHandle<()> {
        let routes = Arc::clone(&self.state.routes);
        let mut current = self.config.clone();

        tokio::spawn(async move {
            while let Some(next) = updates.recv().await {
                if next.listener != current.listener {
                    tracing::warn!("Listener settings changed, restart required to apply");
                }
                if next.upstream != current.upstream {
                    tracing::warn!("Upstream settings changed, restart required to apply");
                }

                let table = Routes::from_config(&next);
                tracing::info!(
                    endpoints = table.endpoints.len(),
                    fallback = table.fallback.is_some(),
                    "Configuration reloaded"
                );
                routes.store(Arc::new(table));
                current = next;
            }
        })
    }

    /// Run the server until shutdown is triggered and connections drain.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, endpoints = self.config.endpoints.len(), "HTTP server starting");

        let shutdown = self.state.shutdown.clone();
        let app = Self::build_router(self.state).into_make_service_with_connect_info::<SocketAddr>();

        // Session tokens are children of `shutdown`, so open streams are
        // already ending when draining starts.
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: looks up the endpoint and dispatches.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let request_id = request_id(&request).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        peer = %peer,
        method = %method,
        path = %path,
        "Dispatching request"
    );

    let routes = state.routes.load_full();
    match routes.endpoints.lookup(&method, &path) {
        Lookup::Found(endpoint) if endpoint.is_sse() => open_stream(&state, &endpoint, request).await,
        Lookup::Found(endpoint) => forward_endpoint(&state.client, &endpoint, request).await,
        Lookup::MethodNotAllowed => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "Method not allowed");
            StatusCode::METHOD_NOT_ALLOWED.into_response()
        }
        Lookup::NoMatch => match &routes.fallback {
            Some(fallback) => forward_fallback(&state.client, fallback, request).await,
            None => {
                tracing::warn!(request_id = %request_id, path = %path, "No endpoint matched");
                StatusCode::NOT_FOUND.into_response()
            }
        },
    }
}

/// Connect the backend, then hand the stream to a new session.
async fn open_stream(state: &AppState, endpoint: &EndpointConfig, request: Request<Body>) -> Response {
    let config = StreamConfig::resolve(&endpoint.extra_config);
    let (parts, body) = request.into_parts();

    let upstream = match connector::connect(&state.client, &endpoint.backend, &parts, body).await {
        Ok(upstream) => upstream,
        Err(e @ ConnectError::Status(_)) => {
            tracing::warn!(endpoint = %endpoint.endpoint, error = %e, "SSE backend refused stream");
            return e.into_response();
        }
        Err(e) => {
            tracing::error!(endpoint = %endpoint.endpoint, error = %e, "SSE backend connection failed");
            return e.into_response();
        }
    };

    let (session, frames) = StreamSession::open(
        config,
        state.frame_buffer,
        &state.shutdown,
        state.sessions.clone(),
    );
    tracing::info!(session = %session.id(), endpoint = %endpoint.endpoint, "SSE stream opened");

    event_stream(session.spawn(Body::new(upstream.into_body()), frames))
}
