//! In-process session store on a sharded concurrent map.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::{Card, Player, Session};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::store::SessionStore;

/// Sessions keyed by id. Each CAS runs under the shard lock of its key, so
/// the version check and the write are one atomic step.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn session_not_found(session_id: &str) -> DomainError {
    DomainError::not_found(
        NotFoundKind::Session,
        format!("session {session_id} not found"),
    )
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(
        &self,
        session_id: &str,
        host: Player,
        cards: Vec<Card>,
    ) -> Result<Session, DomainError> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(_) => Err(DomainError::conflict(
                ConflictKind::SessionExists,
                format!("session {session_id} already exists"),
            )),
            Entry::Vacant(slot) => {
                let session = Session::new(session_id, host, cards, OffsetDateTime::now_utc());
                slot.insert(session.clone());
                debug!(session_id, "session created");
                Ok(session)
            }
        }
    }

    async fn get(&self, session_id: &str) -> Result<Session, DomainError> {
        self.sessions
            .get(session_id)
            .map(|s| s.value().clone())
            .ok_or_else(|| session_not_found(session_id))
    }

    async fn compare_and_swap(
        &self,
        session_id: &str,
        expected_version: u64,
        mut next: Session,
    ) -> Result<Session, DomainError> {
        let mut current = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| session_not_found(session_id))?;

        if current.version != expected_version {
            return Err(DomainError::conflict(
                ConflictKind::OptimisticLock,
                format!(
                    "session {session_id} was modified concurrently (expected version {}, actual version {})",
                    expected_version, current.version
                ),
            ));
        }

        next.session_id = session_id.to_string();
        next.version = expected_version + 1;
        *current = next.clone();
        Ok(next)
    }

    async fn delete(&self, session_id: &str) -> Result<bool, DomainError> {
        Ok(self.sessions.remove(session_id).is_some())
    }

    async fn sweep_expired(
        &self,
        now: OffsetDateTime,
        max_age: Duration,
    ) -> Result<Vec<String>, DomainError> {
        let cutoff = now - max_age;

        let candidates: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.created_at < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        // Re-check under the shard lock; the entry may have been replaced meanwhile.
        let evicted = candidates
            .into_iter()
            .filter(|id| {
                self.sessions
                    .remove_if(id, |_, s| s.created_at < cutoff)
                    .is_some()
            })
            .collect();

        Ok(evicted)
    }

    async fn len(&self) -> Result<usize, DomainError> {
        Ok(self.sessions.len())
    }
}
