//! Session persistence behind a narrow compare-and-swap contract.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::domain::{Card, Player, Session};
use crate::errors::domain::DomainError;

pub use memory::InMemorySessionStore;

/// Keyed session storage.
///
/// All mutation after `create` goes through `compare_and_swap`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a fresh `Waiting` session. Fails `SESSION_EXISTS` when the id is taken.
    async fn create(
        &self,
        session_id: &str,
        host: Player,
        cards: Vec<Card>,
    ) -> Result<Session, DomainError>;

    /// Current committed state. Fails `SESSION_NOT_FOUND`.
    async fn get(&self, session_id: &str) -> Result<Session, DomainError>;

    /// Replace the stored session only if its version still equals
    /// `expected_version`. The stored copy gets `expected_version + 1`,
    /// which is also what the returned session carries.
    ///
    /// Fails `OPTIMISTIC_LOCK` on a version mismatch and `SESSION_NOT_FOUND`
    /// when the session vanished (e.g. swept) in between.
    async fn compare_and_swap(
        &self,
        session_id: &str,
        expected_version: u64,
        next: Session,
    ) -> Result<Session, DomainError>;

    /// Remove a session. Returns whether it existed.
    async fn delete(&self, session_id: &str) -> Result<bool, DomainError>;

    /// Remove sessions created before `now - max_age`; returns the evicted ids.
    async fn sweep_expired(
        &self,
        now: OffsetDateTime,
        max_age: Duration,
    ) -> Result<Vec<String>, DomainError>;

    /// Number of live sessions.
    async fn len(&self) -> Result<usize, DomainError>;
}
