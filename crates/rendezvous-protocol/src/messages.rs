//! Commands (peer -> server) and events (server -> peer).
//!
//! Field names follow the browser client: connection identities travel as
//! `sid`, `peer_sid`, `target_sid` and `sender_sid`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{ConnectionId, PairingCode};

/// Field of a signal payload naming the connection it is addressed to.
pub const TARGET_FIELD: &str = "target_sid";

/// Field the server stamps onto every relayed signal.
pub const SENDER_FIELD: &str = "sender_sid";

/// Opaque signal body. Everything except the `type` tag.
pub type SignalPayload = Map<String, Value>;

// ============================================================================
// Commands (Client -> Server)
// ============================================================================

/// Commands sent by a peer over its WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Ask for a fresh pairing code owned by this connection.
    GenerateCode,

    /// Join the peer that owns `code`.
    ///
    /// Kept as raw JSON so a code of the wrong type is answered as an
    /// unknown code instead of failing the whole frame.
    JoinCode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<Value>,
    },

    /// Relay connection-negotiation data to another connection.
    /// Must carry [`TARGET_FIELD`].
    Signal(SignalPayload),

    /// Keepalive reply.
    Pong,
}

// ============================================================================
// Events (Server -> Client)
// ============================================================================

/// Events delivered to exactly one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once after the socket is accepted, carrying the assigned identity.
    ConnectionSuccess { sid: ConnectionId },

    /// Reply to `generate_code`.
    CodeGenerated { code: PairingCode },

    /// Sent to a code owner when someone joined with its code.
    PeerJoined { peer_sid: ConnectionId },

    /// Sent to the joiner; `peer_sid` is the code owner.
    CodeAccepted { peer_sid: ConnectionId },

    /// Relayed signal, stamped with [`SENDER_FIELD`].
    Signal(SignalPayload),

    /// Request failure, reported to the originating connection only.
    ErrorMessage { message: String },

    /// Keepalive.
    Ping,
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::ErrorMessage {
            message: message.into(),
        }
    }
}
