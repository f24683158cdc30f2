//! Signal forwarding between connections that already know each other.

use std::sync::Arc;

use rendezvous_protocol::{ConnectionId, SENDER_FIELD, ServerEvent, SignalPayload, TARGET_FIELD};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{BrokerError, BrokerResult};
use crate::transport::MessageSink;

/// Stateless relay of opaque signal payloads.
///
/// The payload is forwarded as-is apart from the sender stamp. Whether the
/// target exists is not checked here.
#[derive(Clone)]
pub struct SignalRelay {
    sink: Arc<dyn MessageSink>,
}

impl SignalRelay {
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self { sink }
    }

    /// Forward `payload` to the connection named in its `target_sid` field.
    ///
    /// Returns the target the payload was handed to.
    pub async fn relay(
        &self,
        sender: &ConnectionId,
        mut payload: SignalPayload,
    ) -> BrokerResult<ConnectionId> {
        let target = match payload.get(TARGET_FIELD) {
            Some(Value::String(target)) if !target.is_empty() => ConnectionId::from(target.as_str()),
            _ => {
                warn!("No {} in signal data from {}", TARGET_FIELD, sender);
                return Err(BrokerError::invalid_request("Invalid signal data"));
            }
        };

        payload.insert(
            SENDER_FIELD.to_string(),
            Value::String(sender.as_str().to_string()),
        );

        debug!("Relaying signal from {} to {}", sender, target);
        self.sink.send(&target, ServerEvent::Signal(payload)).await;
        Ok(target)
    }
}
