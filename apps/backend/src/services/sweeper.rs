//! Periodic eviction of sessions older than the retention window.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::errors::domain::DomainError;
use crate::services::coordinator::SessionCoordinator;

/// Run one sweep: evict expired sessions and drop their commit gates.
pub async fn sweep_once(
    coordinator: &SessionCoordinator,
    now: OffsetDateTime,
    ttl: Duration,
) -> Result<Vec<String>, DomainError> {
    let evicted = coordinator.store().sweep_expired(now, ttl).await?;
    coordinator.forget_sessions(&evicted);
    Ok(evicted)
}

/// Spawn the background sweeper. Failures are logged; the task keeps running.
pub fn spawn_sweeper(
    coordinator: Arc<SessionCoordinator>,
    every: Duration,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sweep_once(&coordinator, OffsetDateTime::now_utc(), ttl).await {
                Ok(evicted) if evicted.is_empty() => debug!("Sweep found nothing to evict"),
                Ok(evicted) => info!(evicted = evicted.len(), "Evicted expired sessions"),
                Err(err) => warn!(error = %err, "Session sweep failed"),
            }
        }
    })
}
