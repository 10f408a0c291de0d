//! Move evaluation: the join and flip transitions of a session.
//!
//! Both operations are pure. They take the current session by reference and
//! return either a new session or an error; a failed call never yields a
//! partially mutated state.

use crate::domain::cards::{Card, CardId};
use crate::domain::session::{Player, PlayerId, Session, SessionStatus, MAX_PLAYERS};
use crate::errors::domain::{DomainError, ForbiddenKind, ValidationKind};

/// Result of a join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub session: Session,
    /// False when the player was already seated and nothing changed.
    pub joined: bool,
    /// True when this join filled the table and started play.
    pub started: bool,
}

/// Resolution of a completed pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairResolution {
    pub first_card_id: CardId,
    pub second_card_id: CardId,
    /// Both cards as they looked face up, before a mismatch turned them back.
    pub revealed: Vec<Card>,
}

/// Result of a flip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipOutcome {
    pub session: Session,
    pub card_id: CardId,
    pub match_found: bool,
    pub turn_switched: bool,
    /// Present once two cards were compared during this call.
    pub resolution: Option<PairResolution>,
}

impl FlipOutcome {
    pub fn resolved(&self) -> bool {
        self.resolution.is_some()
    }
}

/// Seat `player` in `session`.
///
/// Joining twice with the same id is a no-op.
pub fn join(session: &Session, player: Player) -> Result<JoinOutcome, DomainError> {
    if session.has_player(&player.id) {
        return Ok(JoinOutcome {
            session: session.clone(),
            joined: false,
            started: false,
        });
    }

    if session.players.len() >= MAX_PLAYERS {
        return Err(DomainError::capacity(format!(
            "session {} already has {} players",
            session.session_id, MAX_PLAYERS
        )));
    }

    // Unreachable through `join` alone; guards records that arrive in the
    // store some other way.
    if session.status != SessionStatus::Waiting {
        return Err(DomainError::invalid_state(format!(
            "session {} is not accepting players",
            session.session_id
        )));
    }

    let mut next = session.clone();
    next.players.push(player);

    let started = next.players.len() == MAX_PLAYERS;
    if started {
        next.status = SessionStatus::InProgress;
    }

    Ok(JoinOutcome {
        session: next,
        joined: true,
        started,
    })
}

/// Flip `card_id` on behalf of `player_id`.
pub fn flip(
    session: &Session,
    player_id: &str,
    card_id: CardId,
) -> Result<FlipOutcome, DomainError> {
    if session.status != SessionStatus::InProgress {
        return Err(DomainError::invalid_state(format!(
            "session {} is {:?}, moves need an in-progress session",
            session.session_id, session.status
        )));
    }

    if player_id != session.current_turn_player_id {
        return Err(DomainError::forbidden(
            ForbiddenKind::NotYourTurn,
            format!("it is {}'s turn", session.current_turn_player_id),
        ));
    }

    let card = session.cards.get(card_id).ok_or_else(|| {
        DomainError::validation(
            ValidationKind::InvalidCard,
            format!(
                "card {card_id} is out of range (deck has {} cards)",
                session.cards.len()
            ),
        )
    })?;

    if card.matched {
        return Err(DomainError::validation(
            ValidationKind::InvalidCard,
            format!("card {card_id} is already matched"),
        ));
    }
    if card.face_up {
        return Err(DomainError::validation(
            ValidationKind::InvalidCard,
            format!("card {card_id} is already face up"),
        ));
    }

    if session.pending_face_up.len() >= 2 {
        return Err(DomainError::validation(
            ValidationKind::TooManyFlipped,
            "two cards are already awaiting evaluation",
        ));
    }

    let mut next = session.clone();
    next.cards[card_id].face_up = true;
    next.pending_face_up.push(card_id);

    if next.pending_face_up.len() < 2 {
        return Ok(FlipOutcome {
            session: next,
            card_id,
            match_found: false,
            turn_switched: false,
            resolution: None,
        });
    }

    let (first, second) = (next.pending_face_up[0], next.pending_face_up[1]);
    next.move_count += 1;
    next.pending_face_up.clear();

    let revealed = vec![next.cards[first].clone(), next.cards[second].clone()];
    let match_found = next.cards[first].match_key == next.cards[second].match_key;

    if match_found {
        next.cards[first].matched = true;
        next.cards[second].matched = true;
        award_point(&mut next, player_id)?;
        if next.all_matched() {
            next.status = SessionStatus::Completed;
        }
    } else {
        next.cards[first].face_up = false;
        next.cards[second].face_up = false;
        next.current_turn_player_id = next_turn(&next, player_id)?;
    }

    Ok(FlipOutcome {
        session: next,
        card_id,
        match_found,
        turn_switched: !match_found,
        resolution: Some(PairResolution {
            first_card_id: first,
            second_card_id: second,
            revealed,
        }),
    })
}

fn award_point(session: &mut Session, player_id: &str) -> Result<(), DomainError> {
    let player = session.player_mut(player_id).ok_or_else(|| {
        DomainError::invalid_state(format!("turn holder {player_id} is not seated"))
    })?;
    player.score += 1;
    Ok(())
}

fn next_turn(session: &Session, player_id: &str) -> Result<PlayerId, DomainError> {
    session
        .next_player_after(player_id)
        .cloned()
        .ok_or_else(|| DomainError::invalid_state(format!("turn holder {player_id} is not seated")))
}
