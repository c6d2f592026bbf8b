//! Pretend SSE backend for manual runs.
//!
//! Serves `/events` on 127.0.0.1:8081: five events, each after a longer pause
//! than the last, then the stream ends. Start the gateway with
//! `demos/gateway.toml` and watch it with `sse-probe`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::{body::Body, http::header, response::Response, routing::get, Router};
use bytes::Bytes;
use futures_util::stream;

const EVENTS: u64 = 5;

async fn events() -> Response {
    let started = Instant::now();
    println!("Backend: stream opened");

    let events = stream::unfold(0u64, move |i| async move {
        if i == EVENTS {
            println!("Backend: finished after {:.2?}", started.elapsed());
            return None;
        }

        let delay = Duration::from_secs(i + 1);
        tokio::time::sleep(delay).await;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let data = serde_json::json!({
            "id": i.to_string(),
            "data": format!("Event {} with {}s delay", i, i + 1),
            "event": "test",
            "timestamp": timestamp,
        });

        println!("Backend: sending event {} (delay {:?})", i, delay);
        let frame = format!("id: {}\nevent: test\ndata: {}\n\n", i, data);
        Some((Ok::<_, Infallible>(Bytes::from(frame)), i + 1))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(events))
        .unwrap()
}

#[tokio::main]
async fn main() {
    let app = Router::new().route("/events", get(events));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Mock SSE backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
