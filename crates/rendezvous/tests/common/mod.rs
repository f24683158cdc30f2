//! Test utilities and common setup.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use futures::{SinkExt, StreamExt};
use rendezvous::api::{self, AppState};
use rendezvous::config::AppConfig;
use rendezvous_protocol::{ConnectionId, ServerEvent};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a test application router with default configuration.
pub fn test_app() -> Router {
    api::create_router(AppState::new(AppConfig::default()))
}

/// Start a real server on an ephemeral port.
///
/// Returns its address and the state it runs with, so tests can inspect the
/// registry directly.
pub async fn spawn_server() -> (SocketAddr, AppState) {
    let state = AppState::new(AppConfig::default());
    let app = api::create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Wait until `check` holds, polling briefly.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while !check().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// One browser-like peer.
pub struct Peer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub sid: ConnectionId,
}

impl Peer {
    /// Open a socket and consume the greeting.
    pub async fn connect(addr: SocketAddr) -> Self {
        let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        let sid = match next_event(&mut ws).await {
            ServerEvent::ConnectionSuccess { sid } => sid,
            other => panic!("expected connection_success, got {other:?}"),
        };
        Self { ws, sid }
    }

    pub async fn send(&mut self, value: Value) {
        self.ws.send(Message::text(value.to_string())).await.unwrap();
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.ws.send(Message::text(text.to_string())).await.unwrap();
    }

    pub async fn recv(&mut self) -> ServerEvent {
        next_event(&mut self.ws).await
    }

    /// Assert nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        let quiet = tokio::time::timeout(Duration::from_millis(200), self.ws.next()).await;
        assert!(quiet.is_err(), "unexpected frame: {quiet:?}");
    }

    pub async fn close(mut self) {
        self.ws.close(None).await.unwrap();
    }
}

async fn next_event(ws: &mut WebSocketStream<MaybeTlsStream<TcpStream>>) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("socket closed")
            .expect("socket error");

        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}
