//! In-process topic registry fanning envelopes out to subscriber channels.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;
use uuid::Uuid;

use crate::errors::domain::DomainError;
use crate::realtime::events::{EventEnvelope, SessionEvent};
use crate::realtime::gateway::{BroadcastGateway, EventStream};

type Topics = DashMap<String, DashMap<Uuid, UnboundedSender<EventEnvelope>>>;

#[derive(Default)]
pub struct LocalHub {
    topics: Arc<Topics>,
}

/// Receiving end of one subscription. Dropping it unregisters the
/// subscriber and removes the topic once nobody is left on it.
struct Subscription {
    topic: String,
    token: Uuid,
    topics: Arc<Topics>,
    inner: UnboundedReceiverStream<EventEnvelope>,
}

impl Stream for Subscription {
    type Item = EventEnvelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.topics.get(&self.topic) {
            subscribers.remove(&self.token);
        }
        self.topics
            .remove_if(&self.topic, |_, subscribers| subscribers.is_empty());
    }
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver to every live subscriber of the envelope's topic.
    /// Returns how many subscribers received it.
    pub fn deliver(&self, envelope: EventEnvelope) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        if let Some(subscribers) = self.topics.get(&envelope.topic) {
            for entry in subscribers.iter() {
                if entry.value().send(envelope.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(*entry.key());
                }
            }
            for token in &dead {
                subscribers.remove(token);
            }
        }

        if !dead.is_empty() {
            debug!(
                topic = %envelope.topic,
                pruned = dead.len(),
                "pruned closed subscribers"
            );
            self.topics
                .remove_if(&envelope.topic, |_, subscribers| subscribers.is_empty());
        }

        delivered
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|s| s.len()).unwrap_or(0)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

#[async_trait]
impl BroadcastGateway for LocalHub {
    async fn publish(&self, topic: &str, event: SessionEvent) -> Result<(), DomainError> {
        let delivered = self.deliver(EventEnvelope::new(topic, event));
        debug!(topic, delivered, "published locally");
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = Uuid::new_v4();
        self.topics
            .entry(topic.to_string())
            .or_default()
            .insert(token, tx);

        Subscription {
            topic: topic.to_string(),
            token,
            topics: self.topics.clone(),
            inner: UnboundedReceiverStream::new(rx),
        }
        .boxed()
    }
}
