//! Rendezvous broker.
//!
//! Lets two peers find each other through a six digit code and then relays
//! their connection-negotiation messages until they talk directly.
//!
//! ## Architecture
//!
//! ```text
//!   peer A ──┐                                        ┌── peer B
//!            │ WebSocket                    WebSocket │
//!   ┌────────▼────────────────────────────────────────▼────────┐
//!   │ ws::WsHub        identity per socket, 1:1 delivery       │
//!   └────────┬─────────────────────────────────────────────────┘
//!            │ ClientCommand
//!   ┌────────▼────────┐
//!   │ broker::Broker  │── generate/join ──► pairing::PairingService
//!   │                 │                        └─ ConnectionRegistry
//!   │                 │── signal ─────────► relay::SignalRelay
//!   └─────────────────┘
//! ```

pub mod api;
pub mod broker;
pub mod config;
pub mod error;
pub mod pairing;
pub mod relay;
pub mod transport;
pub mod ws;

pub use broker::Broker;
pub use error::{BrokerError, BrokerResult};
pub use transport::MessageSink;
