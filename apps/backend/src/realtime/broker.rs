//! Redis-backed gateway: publish to `session-{id}` channels, fan a pattern
//! subscription back into a local hub.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::random;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tokio::time::{sleep, Instant};
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::realtime::events::{session_id_from_topic, EventEnvelope, SessionEvent};
use crate::realtime::gateway::{BroadcastGateway, EventStream};
use crate::realtime::hub::LocalHub;

const CHANNEL_PATTERN: &str = "session-*";

// Subscriber retry configuration (background task)
const INITIAL_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_DELAY_MULTIPLIER: f64 = 2.0;
const JITTER_PERCENT: f64 = 0.2;

// Publisher retry configuration (request path)
const PUBLISHER_MAX_ATTEMPTS: u32 = 3;
const PUBLISHER_INITIAL_RETRY_DELAY_MS: u64 = 50;
const PUBLISHER_MAX_RETRY_DELAY_MS: u64 = 200;

pub struct RedisGateway {
    hub: Arc<LocalHub>,
    /// Multiplexed; each publish works on its own clone.
    publisher: ConnectionManager,
}

impl RedisGateway {
    pub async fn connect(redis_url: &str) -> Result<Arc<Self>, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid MATCHROOM_REDIS_URL: {err}")))?;

        let manager = ConnectionManager::new(client.clone())
            .await
            .map_err(|err| {
                AppError::config(format!(
                    "Unable to initialize Redis connection manager: {err}"
                ))
            })?;

        let hub = Arc::new(LocalHub::new());
        let gateway = Arc::new(Self {
            hub: hub.clone(),
            publisher: manager,
        });

        spawn_subscriber(client, hub);

        Ok(gateway)
    }

    pub fn hub(&self) -> Arc<LocalHub> {
        self.hub.clone()
    }
}

#[async_trait]
impl BroadcastGateway for RedisGateway {
    async fn publish(&self, topic: &str, event: SessionEvent) -> Result<(), DomainError> {
        let envelope = EventEnvelope::new(topic, event);
        let encoded = serde_json::to_string(&envelope).map_err(|err| {
            DomainError::infra(
                InfraErrorKind::Broadcast,
                format!("Failed to serialize realtime envelope: {err}"),
            )
        })?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let mut publisher = self.publisher.clone();
            let publish_res = publisher
                .publish::<_, _, ()>(topic, encoded.as_str())
                .await;

            match publish_res {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt >= PUBLISHER_MAX_ATTEMPTS || !is_transient_error(&err) {
                        return Err(DomainError::infra(
                            InfraErrorKind::Broadcast,
                            format!("Failed to publish realtime event to Redis: {err}"),
                        ));
                    }

                    let delay_ms = PUBLISHER_INITIAL_RETRY_DELAY_MS
                        .saturating_mul(2_u64.pow(attempt - 1))
                        .min(PUBLISHER_MAX_RETRY_DELAY_MS);
                    warn!(
                        error = %err,
                        topic,
                        attempt,
                        retry_delay_ms = delay_ms,
                        "Redis publish failed, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    fn subscribe(&self, topic: &str) -> EventStream {
        self.hub.subscribe(topic)
    }
}

fn spawn_subscriber(client: Client, hub: Arc<LocalHub>) {
    tokio::spawn(async move {
        run_subscription_loop_with_retry(client, hub).await;
    });
}

fn is_transient_error(err: &RedisError) -> bool {
    if err.is_connection_refusal()
        || err.is_timeout()
        || err.is_connection_dropped()
        || err.is_io_error()
    {
        return true;
    }

    let error_msg = err.to_string().to_lowercase();
    if error_msg.contains("authentication failed")
        || error_msg.contains("invalid")
        || error_msg.contains("unsupported")
    {
        return false;
    }

    true
}

fn calculate_retry_delay(attempt: u32) -> Duration {
    let base_delay =
        INITIAL_RETRY_DELAY_SECS as f64 * RETRY_DELAY_MULTIPLIER.powi(attempt as i32 - 1);
    let capped_delay = base_delay.min(MAX_RETRY_DELAY_SECS as f64);

    let jitter_range = capped_delay * JITTER_PERCENT;
    let jitter = (random::<f64>() * 2.0 - 1.0) * jitter_range;
    let final_delay = (capped_delay + jitter).max(0.1);

    Duration::from_secs_f64(final_delay)
}

async fn run_subscription_loop_with_retry(client: Client, hub: Arc<LocalHub>) {
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match run_subscription_loop(&client, &hub).await {
            Ok(()) => {
                info!("Redis subscription loop completed normally");
                break;
            }
            Err(err) => {
                if !is_transient_error(&err) {
                    error!(
                        error = %err,
                        attempt,
                        "Redis subscription failed with permanent error, exiting"
                    );
                    break;
                }

                let delay = calculate_retry_delay(attempt);
                warn!(
                    error = %err,
                    attempt,
                    retry_delay_secs = delay.as_secs_f64(),
                    "Redis subscription failed, retrying"
                );
                sleep(delay).await;

                if attempt >= 20 {
                    attempt = 10;
                }
            }
        }
    }
}

async fn run_subscription_loop(client: &Client, hub: &LocalHub) -> Result<(), RedisError> {
    let mut pubsub = client.get_async_pubsub().await?;

    info!(pattern = CHANNEL_PATTERN, "Subscribing to Redis channel pattern");
    pubsub.psubscribe(CHANNEL_PATTERN).await?;
    info!("Redis subscription established, processing messages");

    let mut stream = pubsub.into_on_message();

    while let Some(msg) = stream.next().await {
        let started = Instant::now();

        let Ok(channel) = msg.get_channel::<String>() else {
            continue;
        };
        let Ok(payload) = msg.get_payload::<String>() else {
            continue;
        };

        match serde_json::from_str::<EventEnvelope>(&payload) {
            Ok(envelope) => {
                if envelope.topic != channel || session_id_from_topic(&channel).is_none() {
                    warn!(
                        channel = %channel,
                        topic = %envelope.topic,
                        "Realtime envelope received on mismatched channel"
                    );
                    continue;
                }
                hub.deliver(envelope);
            }
            Err(err) => {
                error!(
                    error = %err,
                    elapsed_ms = started.elapsed().as_millis(),
                    channel = %channel,
                    "Failed to decode Redis realtime payload"
                );
            }
        }
    }

    warn!("Redis subscription stream ended, connection lost");
    Err(RedisError::from(std::io::Error::new(
        std::io::ErrorKind::ConnectionAborted,
        "subscription stream ended",
    )))
}
