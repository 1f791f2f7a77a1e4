//! Application state
//!
//! Shared state across all handlers.

use std::sync::Arc;

use voicebridge_call::CallManager;
use voicebridge_config::Settings;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Call manager
    pub manager: Arc<CallManager>,
    /// Configuration
    pub config: Arc<Settings>,
}

impl AppState {
    /// Create new application state
    pub fn new(manager: Arc<CallManager>, config: Arc<Settings>) -> Self {
        Self { manager, config }
    }
}
