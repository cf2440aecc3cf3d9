//! Shared state for the development server.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::PagesConfig;

/// Events broadcast to connected live reload clients.
#[derive(Debug, Clone)]
pub enum ReloadEvent {
    /// Compiled outputs changed; paths are relative to the output root.
    /// Clients swap stylesheets in place when every path is a `.css` file.
    Changed { paths: Vec<String> },
    /// Something changed that requires a full page reload.
    Reload,
}

/// Shared server state.
#[derive(Clone)]
pub struct ServerState {
    /// Immutable project configuration.
    pub config: Arc<PagesConfig>,
    /// Channel for broadcasting reload events.
    pub reload_tx: broadcast::Sender<ReloadEvent>,
}

impl ServerState {
    pub fn new(config: Arc<PagesConfig>) -> Self {
        let (reload_tx, _) = broadcast::channel(64);
        Self { config, reload_tx }
    }

    /// Subscribe to reload events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.reload_tx.subscribe()
    }
}
