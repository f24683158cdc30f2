//! Inbound event dispatch.
//!
//! The transport hands every connection event to [`Broker`], which routes it
//! to the pairing service or the signal relay and reports failures back to
//! the originating connection.

use std::sync::Arc;

use rendezvous_protocol::{ClientCommand, ConnectionId, ServerEvent};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{BrokerError, BrokerResult};
use crate::pairing::{CodeGenerator, ConnectionRegistry, PairingService};
use crate::relay::SignalRelay;
use crate::transport::MessageSink;

/// Routes connection events to their handlers.
#[derive(Clone)]
pub struct Broker {
    pairing: PairingService,
    relay: SignalRelay,
    sink: Arc<dyn MessageSink>,
}

impl Broker {
    pub fn new(
        sink: Arc<dyn MessageSink>,
        codes: Arc<dyn CodeGenerator>,
        max_issue_attempts: u32,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            pairing: PairingService::new(registry, codes, sink.clone(), max_issue_attempts),
            relay: SignalRelay::new(sink.clone()),
            sink,
        }
    }

    pub fn pairing(&self) -> &PairingService {
        &self.pairing
    }

    /// Greet a freshly accepted connection with its identity.
    pub async fn connect(&self, id: &ConnectionId) {
        info!("Client connected: {}", id);
        self.sink
            .send(id, ServerEvent::ConnectionSuccess { sid: id.clone() })
            .await;
    }

    /// Handle one command from `id`. Failures go back to `id` only.
    pub async fn dispatch(&self, id: &ConnectionId, cmd: ClientCommand) {
        if let Err(err) = self.handle(id, cmd).await {
            self.report(id, err).await;
        }
    }

    /// Answer a frame that could not be decoded.
    pub async fn reject(&self, id: &ConnectionId, reason: &str) {
        debug!("Undecodable frame from {}: {}", id, reason);
        self.report(id, BrokerError::invalid_request("Malformed message"))
            .await;
    }

    /// Release everything held by `id`. Safe to call more than once.
    pub async fn disconnect(&self, id: &ConnectionId) {
        self.pairing.disconnect(id).await;
        info!("Client disconnected: {}", id);
    }

    async fn handle(&self, id: &ConnectionId, cmd: ClientCommand) -> BrokerResult<()> {
        match cmd {
            ClientCommand::GenerateCode => {
                let code = self.pairing.issue_code(id).await?;
                self.sink.send(id, ServerEvent::CodeGenerated { code }).await;
                Ok(())
            }
            ClientCommand::JoinCode { code } => {
                let code = match code {
                    None | Some(Value::Null) => None,
                    Some(Value::String(code)) => Some(code),
                    Some(other) => {
                        debug!("Non-string code from {}: {}", id, other);
                        return Err(BrokerError::CodeNotFound);
                    }
                };
                self.pairing.join_code(id, code.as_deref()).await?;
                Ok(())
            }
            ClientCommand::Signal(payload) => {
                self.relay.relay(id, payload).await?;
                Ok(())
            }
            ClientCommand::Pong => Ok(()),
        }
    }

    async fn report(&self, id: &ConnectionId, err: BrokerError) {
        warn!(error_code = err.error_code(), "Request from {} failed: {}", id, err);
        self.sink.send(id, ServerEvent::error(err.to_string())).await;
    }
}
