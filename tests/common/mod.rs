//! Shared utilities for integration tests.
//!
//! Backends are raw `TcpListener`s speaking just enough HTTP/1.1, bound to
//! an ephemeral port so tests can run in parallel.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use sse_gateway::config::{BackendTarget, EndpointConfig, GatewayConfig};
use sse_gateway::http::{HttpServer, UpstreamClient};
use sse_gateway::sse::SessionTracker;

/// Read the request head and return its request line.
async fn read_request_line(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

async fn serve<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handler(socket));
        }
    });
    addr
}

/// An SSE backend writing each chunk after its delay (ms), then closing.
pub async fn start_sse_backend(chunks: Vec<(u64, &'static str)>) -> SocketAddr {
    serve(move |mut socket| {
        let chunks = chunks.clone();
        async move {
            read_request_line(&mut socket).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for (delay, chunk) in chunks {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if socket.write_all(chunk.as_bytes()).await.is_err() {
                    return;
                }
            }
            let _ = socket.shutdown().await;
        }
    })
    .await
}

/// A backend answering every request with `status_line` and an empty body.
pub async fn start_status_backend(status_line: &'static str) -> SocketAddr {
    serve(move |mut socket| async move {
        read_request_line(&mut socket).await;
        let response = format!("HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status_line);
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    })
    .await
}

/// A backend answering 200 with the request line it received as the body.
pub async fn start_echo_backend() -> SocketAddr {
    serve(|mut socket| async move {
        let line = read_request_line(&mut socket).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            line.len(),
            line
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    })
    .await
}

/// An endpoint forwarding to `/events` on `backend`.
pub fn endpoint(path: &str, backend: SocketAddr) -> EndpointConfig {
    EndpointConfig {
        endpoint: path.to_string(),
        method: "GET".to_string(),
        backend: vec![BackendTarget {
            host: vec![format!("http://{}", backend)],
            url_pattern: "/events".to_string(),
            method: "GET".to_string(),
        }],
        extra_config: HashMap::new(),
    }
}

/// The same endpoint marked as SSE with the given `sse` table.
pub fn sse_endpoint(path: &str, backend: SocketAddr, sse: Value) -> EndpointConfig {
    let mut endpoint = endpoint(path, backend);
    endpoint.extra_config.insert("sse".to_string(), sse);
    endpoint
}

/// A running gateway.
pub struct Gateway {
    pub addr: SocketAddr,
    pub sessions: SessionTracker,
    pub shutdown: CancellationToken,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until no session is live, or give up after `limit`.
    pub async fn sessions_drained(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.sessions.active_count() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sessions.active_count() == 0
    }
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> Gateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = CancellationToken::new();
    let server = HttpServer::with_client(config, UpstreamClient::default(), shutdown.clone());
    let sessions = server.sessions();

    tokio::spawn(server.run(listener));

    Gateway {
        addr,
        sessions,
        shutdown,
    }
}
