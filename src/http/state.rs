use std::sync::Arc;

use crate::pipeline::SessionManager;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

impl AppState {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }
}
