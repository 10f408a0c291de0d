//! Realtime fan-out of session events.

pub mod broker;
pub mod events;
pub mod gateway;
pub mod hub;

pub use broker::RedisGateway;
pub use events::{topic_for, EventEnvelope, SessionEvent};
pub use gateway::{BroadcastGateway, EventStream};
pub use hub::LocalHub;
