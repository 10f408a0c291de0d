//! Events published on a session topic after each committed transition.

use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardId, Player, PlayerId, Session};

/// Topic name for a session's broadcast channel.
pub fn topic_for(session_id: &str) -> String {
    format!("session-{session_id}")
}

/// Session id from a topic name, if it is one.
pub fn session_id_from_topic(topic: &str) -> Option<&str> {
    topic.strip_prefix("session-").filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "kebab-case")]
#[allow(clippy::large_enum_variant)]
pub enum SessionEvent {
    PlayerJoined {
        player: Player,
        session: Session,
    },
    GameStarted {
        session: Session,
    },
    #[serde(rename_all = "camelCase")]
    CardFlipped {
        card_id: CardId,
        player_id: PlayerId,
        session: Session,
    },
    #[serde(rename_all = "camelCase")]
    MatchResult {
        match_found: bool,
        turn_switched: bool,
        first_card_id: CardId,
        second_card_id: CardId,
        revealed: Vec<Card>,
        session: Session,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::PlayerJoined { .. } => "player-joined",
            SessionEvent::GameStarted { .. } => "game-started",
            SessionEvent::CardFlipped { .. } => "card-flipped",
            SessionEvent::MatchResult { .. } => "match-result",
        }
    }

    pub fn session(&self) -> &Session {
        match self {
            SessionEvent::PlayerJoined { session, .. }
            | SessionEvent::GameStarted { session }
            | SessionEvent::CardFlipped { session, .. }
            | SessionEvent::MatchResult { session, .. } => session,
        }
    }

    /// Committed version this event describes.
    pub fn version(&self) -> u64 {
        self.session().version
    }
}

/// What travels over a topic: the event plus routing and ordering metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub topic: String,
    pub version: u64,
    pub event: SessionEvent,
}

impl EventEnvelope {
    pub fn new(topic: impl Into<String>, event: SessionEvent) -> Self {
        Self {
            topic: topic.into(),
            version: event.version(),
            event,
        }
    }
}
