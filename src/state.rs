//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::db::FileStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: Arc<dyn FileStore>,
}

impl AppState {
    /// Create a new application state around an injected file store
    pub fn new(config: Config, store: Arc<dyn FileStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the file store
    pub fn store(&self) -> &dyn FileStore {
        self.inner.store.as_ref()
    }
}
