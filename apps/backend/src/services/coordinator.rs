//! Session coordinator: read, evaluate, compare-and-swap, then publish.
//!
//! Every mutation runs the full cycle from a fresh read. A lost CAS race
//! restarts the cycle; after the retry budget is spent the request fails
//! `TOO_MANY_RETRIES`. Publication happens only after a successful write and,
//! within one process, in commit order: a per-session gate is held from the
//! CAS through the end of publishing.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    default_deck, evaluator, validate_session_id, Card, CardId, Player, Session,
};
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};
use crate::realtime::{topic_for, BroadcastGateway, SessionEvent};
use crate::store::SessionStore;

/// Retries after the first attempt when no budget is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResult {
    pub session: Session,
    pub joined: bool,
    pub started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub session: Session,
    pub card_id: CardId,
    pub match_found: bool,
    pub turn_switched: bool,
    pub resolved: bool,
    pub first_card_id: Option<CardId>,
    pub second_card_id: Option<CardId>,
    pub revealed: Vec<Card>,
}

/// Outcome of one evaluation: the state to commit (None for a no-op) and
/// whatever the caller needs to report.
struct Transition<T> {
    next: Option<Session>,
    outcome: T,
}

pub struct SessionCoordinator {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn BroadcastGateway>,
    commit_gates: DashMap<String, Arc<Mutex<()>>>,
    max_retries: u32,
    default_pair_count: usize,
}

impl SessionCoordinator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn BroadcastGateway>,
        max_retries: u32,
        default_pair_count: usize,
    ) -> Self {
        Self {
            store,
            gateway,
            commit_gates: DashMap::new(),
            max_retries,
            default_pair_count,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<dyn BroadcastGateway> {
        &self.gateway
    }

    /// Create a `Waiting` session hosted by `host`.
    ///
    /// `session_id` defaults to a fresh UUID; `pair_count` to the configured deck size.
    pub async fn create_session(
        &self,
        host: Player,
        session_id: Option<String>,
        pair_count: Option<usize>,
    ) -> Result<Session, DomainError> {
        validate_player(&host)?;

        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        validate_session_id(&session_id)?;

        let cards = default_deck(pair_count.unwrap_or(self.default_pair_count))?;

        let session = self.store.create(&session_id, host, cards).await?;
        info!(
            session_id = %session.session_id,
            host_player_id = %session.host_player_id,
            cards = session.cards.len(),
            "Session created"
        );
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session, DomainError> {
        self.store.get(session_id).await
    }

    /// Seat `player`. Re-joining with a seated id changes nothing and publishes nothing.
    pub async fn join_session(
        &self,
        session_id: &str,
        player: Player,
    ) -> Result<JoinResult, DomainError> {
        validate_player(&player)?;
        debug!(session_id, player_id = %player.id, "Joining session");

        let (session, (joined, started)) = self
            .run_transition(
                session_id,
                |current| {
                    let outcome = evaluator::join(current, player.clone())?;
                    Ok(Transition {
                        next: outcome.joined.then_some(outcome.session),
                        outcome: (outcome.joined, outcome.started),
                    })
                },
                |committed, &(_, started)| {
                    let mut events = Vec::with_capacity(2);
                    if let Some(seated) = committed.player(&player.id) {
                        events.push(SessionEvent::PlayerJoined {
                            player: seated.clone(),
                            session: committed.clone(),
                        });
                    }
                    if started {
                        events.push(SessionEvent::GameStarted {
                            session: committed.clone(),
                        });
                    }
                    events
                },
            )
            .await?;

        if joined {
            info!(
                session_id,
                player_id = %player.id,
                started,
                version = session.version,
                "Player joined"
            );
        }

        Ok(JoinResult {
            session,
            joined,
            started,
        })
    }

    /// Flip `card_id` for `player_id`.
    pub async fn request_move(
        &self,
        session_id: &str,
        player_id: &str,
        card_id: CardId,
    ) -> Result<MoveResult, DomainError> {
        debug!(session_id, player_id, card_id, "Requesting move");

        let (session, outcome) = self
            .run_transition(
                session_id,
                |current| {
                    let outcome = evaluator::flip(current, player_id, card_id)?;
                    Ok(Transition {
                        next: Some(outcome.session.clone()),
                        outcome,
                    })
                },
                |committed, outcome| {
                    let event = match &outcome.resolution {
                        None => SessionEvent::CardFlipped {
                            card_id,
                            player_id: player_id.to_string(),
                            session: committed.clone(),
                        },
                        Some(pair) => SessionEvent::MatchResult {
                            match_found: outcome.match_found,
                            turn_switched: outcome.turn_switched,
                            first_card_id: pair.first_card_id,
                            second_card_id: pair.second_card_id,
                            revealed: pair.revealed.clone(),
                            session: committed.clone(),
                        },
                    };
                    vec![event]
                },
            )
            .await?;

        if outcome.resolved() {
            info!(
                session_id,
                player_id,
                card_id,
                match_found = outcome.match_found,
                turn_switched = outcome.turn_switched,
                status = ?session.status,
                version = session.version,
                "Pair resolved"
            );
        }

        let (first_card_id, second_card_id, revealed) = match outcome.resolution {
            Some(pair) => (
                Some(pair.first_card_id),
                Some(pair.second_card_id),
                pair.revealed,
            ),
            None => (None, None, Vec::new()),
        };

        Ok(MoveResult {
            session,
            card_id,
            match_found: outcome.match_found,
            turn_switched: outcome.turn_switched,
            resolved: first_card_id.is_some(),
            first_card_id,
            second_card_id,
            revealed,
        })
    }

    /// Drop bookkeeping for sessions that no longer exist.
    pub fn forget_sessions(&self, session_ids: &[String]) {
        for id in session_ids {
            self.commit_gates.remove(id);
        }
    }

    pub fn gate_count(&self) -> usize {
        self.commit_gates.len()
    }

    fn gate(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.commit_gates
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    async fn run_transition<T, E, P>(
        &self,
        session_id: &str,
        mut evaluate: E,
        events: P,
    ) -> Result<(Session, T), DomainError>
    where
        T: Send,
        E: FnMut(&Session) -> Result<Transition<T>, DomainError> + Send,
        P: FnOnce(&Session, &T) -> Vec<SessionEvent> + Send,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let current = self.store.get(session_id).await?;
            let Transition { next, outcome } = evaluate(&current)?;
            let Some(next) = next else {
                return Ok((current, outcome));
            };

            let gate = self.gate(session_id);
            let _commit_guard = gate.lock_owned().await;

            match self
                .store
                .compare_and_swap(session_id, current.version, next)
                .await
            {
                Ok(committed) => {
                    self.publish_all(session_id, events(&committed, &outcome))
                        .await;
                    return Ok((committed, outcome));
                }
                Err(err) if err.is_cas_conflict() => {
                    if attempt > self.max_retries {
                        warn!(
                            session_id,
                            attempt, "Giving up after repeated write conflicts"
                        );
                        return Err(DomainError::conflict(
                            ConflictKind::TooManyRetries,
                            format!(
                                "session {session_id} is too busy, gave up after {attempt} attempts"
                            ),
                        ));
                    }
                    debug!(session_id, attempt, "Lost write race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn publish_all(&self, session_id: &str, events: Vec<SessionEvent>) {
        let topic = topic_for(session_id);
        for event in events {
            let name = event.name();
            let version = event.version();
            // The write is already committed; subscribers resync from a snapshot.
            if let Err(err) = self.gateway.publish(&topic, event).await {
                warn!(
                    session_id,
                    event = name,
                    version,
                    error = %err,
                    "Failed to publish session event"
                );
            }
        }
    }
}

fn validate_player(player: &Player) -> Result<(), DomainError> {
    if player.id.trim().is_empty() {
        return Err(DomainError::validation(
            ValidationKind::Other("PLAYER_ID".into()),
            "playerId must not be empty",
        ));
    }
    Ok(())
}
