use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::realtime::{BroadcastGateway, LocalHub, RedisGateway};
use crate::services::SessionCoordinator;
use crate::state::app_state::AppState;
use crate::store::{InMemorySessionStore, SessionStore};

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    config: AppConfig,
    store: Option<Arc<dyn SessionStore>>,
    gateway: Option<Arc<dyn BroadcastGateway>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            store: None,
            gateway: None,
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use this gateway instead of deriving one from the config.
    pub fn with_gateway(mut self, gateway: Arc<dyn BroadcastGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));

        let gateway: Arc<dyn BroadcastGateway> = match (self.gateway, &self.config.redis_url) {
            (Some(gateway), _) => gateway,
            (None, Some(url)) => {
                info!("Realtime events fan out through Redis");
                RedisGateway::connect(url).await?
            }
            (None, None) => {
                info!("Realtime events stay in-process");
                Arc::new(LocalHub::new())
            }
        };

        let coordinator = SessionCoordinator::new(
            store,
            gateway,
            self.config.max_move_retries,
            self.config.pair_count,
        );

        Ok(AppState::new(self.config, coordinator))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
