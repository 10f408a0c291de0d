//! Card types for a matching deck.

use serde::{Deserialize, Serialize};

/// Ordinal position of a card within its session's deck.
pub type CardId = usize;

/// Opaque symbol shared by exactly two cards of a deck.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchKey(pub String);

impl MatchKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub match_key: MatchKey,
    /// Asset path for the card face. Absent in records written before faces existed.
    #[serde(default)]
    pub face: String,
    pub face_up: bool,
    pub matched: bool,
}

impl Card {
    pub fn new(id: CardId, match_key: MatchKey, face: impl Into<String>) -> Self {
        Self {
            id,
            match_key,
            face: face.into(),
            face_up: false,
            matched: false,
        }
    }

    /// A card can be flipped only while it is face down and unmatched.
    pub fn is_flippable(&self) -> bool {
        !self.face_up && !self.matched
    }
}
