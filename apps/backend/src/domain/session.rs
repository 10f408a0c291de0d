//! Session aggregate: cards, players, turn and status.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::cards::{Card, CardId};
use crate::errors::domain::{DomainError, ValidationKind};

/// Two players at most per session.
pub const MAX_PLAYERS: usize = 2;

/// Longest accepted session id.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Opaque player identity supplied by clients.
pub type PlayerId = String;

/// Session ids are 1..=64 chars of `[A-Za-z0-9_-]`; they end up in topic names.
pub fn validate_session_id(raw: &str) -> Result<(), DomainError> {
    let well_formed = !raw.is_empty()
        && raw.len() <= MAX_SESSION_ID_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidSessionId,
            format!("Invalid session id: {raw:?}"),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub score: u32,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            score: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Waiting,
    InProgress,
    Completed,
}

fn initial_version() -> u64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub cards: Vec<Card>,
    pub players: Vec<Player>,
    pub current_turn_player_id: PlayerId,
    pub status: SessionStatus,
    pub pending_face_up: Vec<CardId>,
    pub move_count: u32,
    pub host_player_id: PlayerId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Compare-and-swap token; bumped by the store on every committed write.
    #[serde(default = "initial_version")]
    pub version: u64,
}

impl Session {
    /// Fresh session in `Waiting` with the host as the only player and turn holder.
    pub fn new(
        session_id: impl Into<String>,
        host: Player,
        cards: Vec<Card>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            cards,
            current_turn_player_id: host.id.clone(),
            host_player_id: host.id.clone(),
            players: vec![host],
            status: SessionStatus::Waiting,
            pending_face_up: Vec::new(),
            move_count: 0,
            created_at,
            version: initial_version(),
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.player(player_id).is_some()
    }

    /// Player after `player_id` in join order, wrapping around.
    pub fn next_player_after(&self, player_id: &str) -> Option<&PlayerId> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        let next = (idx + 1) % self.players.len();
        Some(&self.players[next].id)
    }

    pub fn all_matched(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
    }

    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count() / 2
    }

    /// Checks the invariants every committed session must satisfy.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.pending_face_up.len() > 1 {
            return Err(format!(
                "pending_face_up has {} entries",
                self.pending_face_up.len()
            ));
        }
        if self.players.len() > MAX_PLAYERS {
            return Err(format!("{} players in session", self.players.len()));
        }
        if let Some(card) = self.cards.iter().find(|c| c.matched && !c.face_up) {
            return Err(format!("card {} is matched but face down", card.id));
        }
        for (idx, card) in self.cards.iter().enumerate() {
            if card.id != idx {
                return Err(format!("card at position {idx} has id {}", card.id));
            }
            let face_up_unmatched = card.face_up && !card.matched;
            if face_up_unmatched && !self.pending_face_up.contains(&card.id) {
                return Err(format!("card {} is face up outside a pending flip", card.id));
            }
        }
        if (self.status == SessionStatus::Completed) != (self.all_matched() && !self.cards.is_empty())
        {
            return Err(format!(
                "status {:?} disagrees with matched cards",
                self.status
            ));
        }
        match self.status {
            SessionStatus::Waiting if self.players.len() >= MAX_PLAYERS => {
                return Err("waiting with a full table".into());
            }
            SessionStatus::InProgress if self.players.len() != MAX_PLAYERS => {
                return Err("in progress without two players".into());
            }
            SessionStatus::Waiting => {}
            _ => {
                if !self.has_player(&self.current_turn_player_id) {
                    return Err(format!(
                        "turn holder {} is not seated",
                        self.current_turn_player_id
                    ));
                }
            }
        }
        Ok(())
    }
}
