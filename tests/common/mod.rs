//! Shared utilities for integration testing: an in-process stand-in for the
//! timeout endpoint, with the same routes and delay parameters.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::{stream, StreamExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use timeout_harness::{ClientProfile, TimeoutBudget};

pub const CHUNK: usize = 1024;
pub const SLOW_CHUNKS: u32 = 4;

type Params = Query<HashMap<String, String>>;

fn delay(params: &HashMap<String, String>, name: &str, default_ms: u64) -> Duration {
    let ms = params
        .get(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// `count` chunks of `CHUNK` bytes, sleeping `pause` between them.
fn paced_body(count: u32, pause: Duration) -> Body {
    let chunks = stream::unfold(0u32, move |i| async move {
        if i >= count {
            return None;
        }
        if i > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        Some((Ok::<_, io::Error>(Bytes::from(vec![b'x'; CHUNK])), i + 1))
    });
    Body::from_stream(chunks)
}

async fn ping() -> &'static str {
    "pong"
}

async fn download_slow_server(Query(params): Params) -> Response {
    let pause = delay(&params, "delayBetweenChunks", 6_000);
    paced_body(SLOW_CHUNKS, pause).into_response()
}

async fn download_large_file() -> Response {
    paced_body(256, Duration::ZERO).into_response()
}

async fn download_streaming() -> Response {
    paced_body(64, Duration::ZERO).into_response()
}

async fn upload_slow_server(Query(params): Params, body: Body) -> String {
    let pause = delay(&params, "delayBetweenReads", 6_000);
    let mut frames = body.into_data_stream();
    let mut total = 0usize;
    loop {
        tokio::time::sleep(pause).await;
        match frames.next().await {
            Some(Ok(frame)) => total += frame.len(),
            _ => break,
        }
    }
    format!("received {}", total)
}

async fn drain(body: Body) -> usize {
    let mut frames = body.into_data_stream();
    let mut total = 0usize;
    while let Some(Ok(frame)) = frames.next().await {
        total += frame.len();
    }
    total
}

async fn upload_slow_response(Query(params): Params, body: Body) -> String {
    let pause = delay(&params, "delayBeforeResponse", 8_000);
    let total = drain(body).await;
    tokio::time::sleep(pause).await;
    format!("received {}", total)
}

async fn upload_normal(body: Body) -> String {
    format!("received {}", drain(body).await)
}

async fn upload_expect_fast_client(body: Body) -> Response {
    let mut frames = body.into_data_stream();
    let mut total = 0usize;
    loop {
        match tokio::time::timeout(Duration::from_millis(200), frames.next()).await {
            Ok(Some(Ok(frame))) => total += frame.len(),
            Ok(_) => break,
            Err(_) => return StatusCode::REQUEST_TIMEOUT.into_response(),
        }
    }
    format!("received {}", total).into_response()
}

fn router() -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/download/slow-server", get(download_slow_server))
        .route("/api/download/large-file", get(download_large_file))
        .route("/api/download/expect-slow-client", get(download_streaming))
        .route("/api/download/test-server-write-timeout", get(download_streaming))
        .route("/api/upload/slow-server", post(upload_slow_server))
        .route("/api/upload/slow-response", post(upload_slow_response))
        .route("/api/upload/normal", post(upload_normal))
        .route("/api/upload/expect-fast-client", post(upload_expect_fast_client))
}

/// Start the mock endpoint on an ephemeral port and return its base URL.
pub async fn start_mock_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router()).await;
    });

    format!("http://{}", addr)
}

/// An address nothing is listening on.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A listener that never accepts, with its backlog already full, so new
/// connects hang in the handshake. Keep it alive for the test's duration.
pub struct StalledEndpoint {
    pub base_url: String,
    _listener: TcpListener,
    _held: Vec<TcpStream>,
}

pub async fn stalled_endpoint() -> StalledEndpoint {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut held = Vec::new();
    for _ in 0..64 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => held.push(stream),
            _ => break,
        }
    }

    StalledEndpoint {
        base_url: format!("http://{}", addr),
        _listener: listener,
        _held: held,
    }
}

/// Profiles with millisecond budgets so tests finish quickly.
pub fn fast_profiles() -> Vec<ClientProfile> {
    vec![
        ClientProfile::new("fast-read", TimeoutBudget::from_millis(1_000, 300, 5_000)),
        ClientProfile::new("fast-write", TimeoutBudget::from_millis(1_000, 5_000, 300)),
        ClientProfile::new("patient", TimeoutBudget::from_millis(1_000, 5_000, 5_000)),
        ClientProfile::new("normal", TimeoutBudget::from_millis(1_000, 5_000, 5_000)),
        // Connect budget far above read/write, like the built-ins.
        ClientProfile::new("slow-dial-read", TimeoutBudget::from_millis(1_500, 300, 5_000)),
        ClientProfile::new("slow-dial-write", TimeoutBudget::from_millis(1_500, 5_000, 300)),
        ClientProfile::new("slow-dial", TimeoutBudget::from_millis(10_000, 10_000, 10_000)),
    ]
}
