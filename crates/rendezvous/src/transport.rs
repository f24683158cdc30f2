//! Outbound side of the transport.

use async_trait::async_trait;
use rendezvous_protocol::{ConnectionId, ServerEvent};

/// Delivers events to a single connection.
///
/// There is no broadcast: every call addresses exactly one identity.
/// Unknown or closed connections are the sink's problem; callers are never
/// told whether delivery succeeded.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, to: &ConnectionId, event: ServerEvent);
}
