// Application state module
// Read-only state shared by every connection

use std::sync::Arc;

use super::types::Config;
use crate::client::TaskApi;
use crate::views::ViewEngine;

/// Application state
pub struct AppState {
    pub config: Config,
    pub tasks: Arc<dyn TaskApi>,
    pub views: ViewEngine,
}

impl AppState {
    pub fn new(config: &Config, tasks: Arc<dyn TaskApi>, views: ViewEngine) -> Self {
        Self {
            config: config.clone(),
            tasks,
            views,
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
