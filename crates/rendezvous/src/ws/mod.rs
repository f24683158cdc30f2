//! WebSocket transport.
//!
//! Each peer holds one socket. The hub assigns it a [`ConnectionId`] on
//! upgrade and delivers [`ServerEvent`]s addressed to that identity; the
//! handler decodes inbound frames and feeds them to the broker.
//!
//! [`ConnectionId`]: rendezvous_protocol::ConnectionId
//! [`ServerEvent`]: rendezvous_protocol::ServerEvent

mod handler;
mod hub;

pub use handler::ws_handler;
pub use hub::WsHub;
