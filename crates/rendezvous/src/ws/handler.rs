//! WebSocket handler for peer connections.

use std::time::Duration;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rendezvous_protocol::{ClientCommand, ServerEvent};
use tokio::time::{Instant, interval_at};

use crate::api::AppState;

/// WebSocket upgrade handler.
///
/// GET /ws
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drive one peer connection from upgrade to close.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let hub = state.hub.clone();
    let broker = state.broker.clone();

    let (conn_id, mut event_rx) = hub.register();
    broker.connect(&conn_id).await;

    let ping_period = Duration::from_secs(state.config.ws.ping_interval_secs);
    let conn_id_send = conn_id.clone();
    let send_task = tokio::spawn(async move {
        let mut ping_interval = interval_at(Instant::now() + ping_period, ping_period);

        loop {
            let event = tokio::select! {
                event = event_rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                _ = ping_interval.tick() => ServerEvent::Ping,
            };

            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    warn!("Failed to serialize event for {}: {}", conn_id_send, e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                debug!("Socket for {} closed while sending", conn_id_send);
                break;
            }
        }
    });

    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientCommand>(text.as_str()) {
                Ok(cmd) => broker.dispatch(&conn_id, cmd).await,
                Err(e) => {
                    warn!("Failed to parse command from {}: {}", conn_id, e);
                    broker.reject(&conn_id, &e.to_string()).await;
                }
            },
            Ok(Message::Binary(_)) => {
                debug!("Received binary message from {}, ignoring", conn_id);
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!("Connection {} closed by peer", conn_id);
                break;
            }
            Err(e) => {
                warn!("WebSocket error for {}: {}", conn_id, e);
                break;
            }
        }
    }

    // Purge before unregistering so no later event can see a live code
    // for an identity the hub no longer knows.
    broker.disconnect(&conn_id).await;
    hub.unregister(&conn_id);
    send_task.abort();
}
