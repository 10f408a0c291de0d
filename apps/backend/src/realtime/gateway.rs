//! Publish/subscribe boundary between the coordinator and connected clients.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::domain::DomainError;
use crate::realtime::events::{EventEnvelope, SessionEvent};

/// Lazy, unbounded sequence of envelopes delivered on one topic.
pub type EventStream = BoxStream<'static, EventEnvelope>;

/// Topic-based fan-out. Delivery order is only guaranteed within one topic.
#[async_trait]
pub trait BroadcastGateway: Send + Sync {
    async fn publish(&self, topic: &str, event: SessionEvent) -> Result<(), DomainError>;

    /// Subscribe to `topic`. Envelopes published after this call returns are
    /// delivered to the stream; dropping the stream ends the subscription.
    fn subscribe(&self, topic: &str) -> EventStream;
}
