use std::sync::Arc;

use crate::config::AppConfig;
use crate::realtime::BroadcastGateway;
use crate::services::SessionCoordinator;
use crate::store::SessionStore;

/// Shared resources handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub coordinator: Arc<SessionCoordinator>,
}

impl AppState {
    pub fn new(config: AppConfig, coordinator: SessionCoordinator) -> Self {
        Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        self.coordinator.store()
    }

    pub fn gateway(&self) -> &Arc<dyn BroadcastGateway> {
        self.coordinator.gateway()
    }
}
