//! Wire types for the rendezvous pairing and signaling protocol.
//!
//! Peers hold one WebSocket each. Every frame is a JSON object tagged by a
//! `type` field: [`ClientCommand`] flows from peer to server, [`ServerEvent`]
//! flows from server to exactly one peer.

pub mod ids;
pub mod messages;

pub use ids::{ConnectionId, PairingCode};
pub use messages::{ClientCommand, SENDER_FIELD, ServerEvent, SignalPayload, TARGET_FIELD};
