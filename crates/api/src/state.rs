use std::sync::Arc;

use pageforge_core::events::bus::EventBus;
use pageforge_core::PostgresStore;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor. Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    pub store: PostgresStore,
    pub config: AppConfig,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(store: PostgresStore, config: AppConfig, event_bus: EventBus) -> Self {
        Self {
            inner: Arc::new(InnerState {
                store,
                config,
                event_bus,
            }),
        }
    }

    pub fn store(&self) -> &PostgresStore {
        &self.inner.store
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }
}
