//! WebSocket hub: identity assignment and per-connection delivery.

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use rendezvous_protocol::{ConnectionId, ServerEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::transport::MessageSink;

/// A sender for WebSocket messages to a specific client.
type WsSender = mpsc::Sender<ServerEvent>;

/// Tracks every open WebSocket by the identity it was assigned.
pub struct WsHub {
    /// Connection ID -> outbound queue
    connections: DashMap<ConnectionId, WsSender>,

    /// Capacity of each outbound queue.
    buffer: usize,
}

impl WsHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Register a new connection.
    ///
    /// Returns its identity and the receiver for events addressed to it.
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let mut id = ConnectionId::generate();
        while self.connections.contains_key(&id) {
            id = ConnectionId::generate();
        }
        self.connections.insert(id.clone(), tx);
        info!("Registered WebSocket connection {}", id);
        (id, rx)
    }

    /// Unregister a connection. Later sends to it are dropped.
    pub fn unregister(&self, id: &ConnectionId) {
        if self.connections.remove(id).is_some() {
            info!("Unregistered WebSocket connection {}", id);
        }
    }

    pub fn is_connected(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[async_trait]
impl MessageSink for WsHub {
    async fn send(&self, to: &ConnectionId, event: ServerEvent) {
        // Clone the sender out so no map shard stays locked across the await.
        let Some(tx) = self.connections.get(to).map(|entry| entry.value().clone()) else {
            debug!("Dropping event for unknown connection {}", to);
            return;
        };
        // A full queue drops the event rather than waiting on a slow reader.
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full for connection {}, dropping event", to);
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Failed to send event to connection {}", to);
            }
        }
    }
}
