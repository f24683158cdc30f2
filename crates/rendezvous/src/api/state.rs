//! Application state shared across handlers.

use std::sync::Arc;

use crate::broker::Broker;
use crate::config::AppConfig;
use crate::pairing::{CodeGenerator, RandomCodeGenerator};
use crate::ws::WsHub;

#[derive(Clone)]
pub struct AppState {
    /// Inbound event dispatcher.
    pub broker: Arc<Broker>,
    /// Open WebSocket connections.
    pub hub: Arc<WsHub>,
    /// Effective configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_code_generator(config, Arc::new(RandomCodeGenerator))
    }

    /// Build state around a specific code source.
    pub fn with_code_generator(config: AppConfig, codes: Arc<dyn CodeGenerator>) -> Self {
        let hub = Arc::new(WsHub::new(config.ws.send_buffer));
        let broker = Broker::new(hub.clone(), codes, config.pairing.max_issue_attempts);
        Self {
            broker: Arc::new(broker),
            hub,
            config: Arc::new(config),
        }
    }
}
