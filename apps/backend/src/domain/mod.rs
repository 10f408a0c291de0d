//! Domain layer: pure session logic types and helpers.

pub mod cards;
pub mod deck;
pub mod evaluator;
pub mod session;

#[cfg(test)]
mod tests_evaluator;

// Re-exports for ergonomics
pub use cards::{Card, CardId, MatchKey};
pub use deck::{default_deck, generate_deck, generate_deck_with_seed, CARD_SLUGS, DEFAULT_PAIR_COUNT};
pub use evaluator::{flip, join, FlipOutcome, JoinOutcome, PairResolution};
pub use session::{validate_session_id, Player, PlayerId, Session, SessionStatus, MAX_PLAYERS};
