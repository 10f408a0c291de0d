//! Scenario tests for join and flip.

use time::OffsetDateTime;

use crate::domain::cards::{Card, MatchKey};
use crate::domain::deck::face_path;
use crate::domain::evaluator::{flip, join};
use crate::domain::session::{Player, Session, SessionStatus};
use crate::errors::domain::{DomainError, ForbiddenKind, ValidationKind};

/// 8 pairs laid out so that 0/1 match and 2/3 do not.
fn scripted_cards() -> Vec<Card> {
    let keys = [
        "apple", "apple", "cat", "dice", "cat", "dice", "fox", "fox", "moon", "moon", "star",
        "star", "pizza", "pizza", "panda", "panda",
    ];
    keys.iter()
        .enumerate()
        .map(|(id, key)| Card::new(id, MatchKey::new(*key), face_path(key)))
        .collect()
}

fn waiting_session() -> Session {
    Session::new(
        "room-1",
        Player::new("alice", "Alice"),
        scripted_cards(),
        OffsetDateTime::UNIX_EPOCH,
    )
}

fn started_session() -> Session {
    join(&waiting_session(), Player::new("bob", "Bob"))
        .unwrap()
        .session
}

#[test]
fn new_session_waits_with_host_holding_turn() {
    let session = waiting_session();
    assert_eq!(session.status, SessionStatus::Waiting);
    assert_eq!(session.players.len(), 1);
    assert_eq!(session.current_turn_player_id, "alice");
    assert_eq!(session.host_player_id, "alice");
    assert_eq!(session.version, 1);
    session.check_invariants().unwrap();
}

#[test]
fn second_join_starts_the_game() {
    let outcome = join(&waiting_session(), Player::new("bob", "Bob")).unwrap();
    assert!(outcome.joined);
    assert!(outcome.started);
    assert_eq!(outcome.session.status, SessionStatus::InProgress);
    assert_eq!(outcome.session.current_turn_player_id, "alice");
    assert_eq!(outcome.session.players[1].id, "bob");
    outcome.session.check_invariants().unwrap();
}

#[test]
fn join_is_idempotent_for_seated_player() {
    let mut session = started_session();
    session.players[0].score = 4;

    let outcome = join(&session, Player::new("alice", "Renamed")).unwrap();
    assert!(!outcome.joined);
    assert!(!outcome.started);
    assert_eq!(outcome.session, session);
}

#[test]
fn third_player_is_rejected() {
    let session = started_session();
    let err = join(&session, Player::new("carol", "Carol")).unwrap_err();
    assert!(matches!(err, DomainError::Capacity(_)));
}

#[test]
fn flip_before_start_is_invalid_state() {
    let err = flip(&waiting_session(), "alice", 0).unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[test]
fn single_flip_stays_pending() {
    let session = started_session();
    let outcome = flip(&session, "alice", 0).unwrap();

    assert!(!outcome.resolved());
    assert!(!outcome.match_found);
    assert!(!outcome.turn_switched);
    assert!(outcome.session.cards[0].face_up);
    assert_eq!(outcome.session.pending_face_up, vec![0]);
    assert_eq!(outcome.session.move_count, 0);
    outcome.session.check_invariants().unwrap();
}

#[test]
fn matching_pair_scores_and_keeps_turn() {
    let session = started_session();
    let first = flip(&session, "alice", 0).unwrap().session;
    let outcome = flip(&first, "alice", 1).unwrap();

    assert!(outcome.match_found);
    assert!(!outcome.turn_switched);
    let s = &outcome.session;
    assert!(s.cards[0].matched && s.cards[0].face_up);
    assert!(s.cards[1].matched && s.cards[1].face_up);
    assert_eq!(s.player("alice").unwrap().score, 1);
    assert_eq!(s.player("bob").unwrap().score, 0);
    assert_eq!(s.current_turn_player_id, "alice");
    assert!(s.pending_face_up.is_empty());
    assert_eq!(s.move_count, 1);
    assert_eq!(s.status, SessionStatus::InProgress);
    s.check_invariants().unwrap();

    let resolution = outcome.resolution.unwrap();
    assert_eq!((resolution.first_card_id, resolution.second_card_id), (0, 1));
}

#[test]
fn mismatch_passes_turn_and_turns_cards_back() {
    let session = started_session();
    let first = flip(&session, "alice", 2).unwrap().session;
    let outcome = flip(&first, "alice", 3).unwrap();

    assert!(!outcome.match_found);
    assert!(outcome.turn_switched);
    let s = &outcome.session;
    assert_eq!(s.current_turn_player_id, "bob");
    assert!(!s.cards[2].face_up && !s.cards[2].matched);
    assert!(!s.cards[3].face_up && !s.cards[3].matched);
    assert!(s.pending_face_up.is_empty());
    assert_eq!(s.player("alice").unwrap().score, 0);
    s.check_invariants().unwrap();

    let revealed = outcome.resolution.unwrap().revealed;
    assert_eq!(revealed.len(), 2);
    assert!(revealed.iter().all(|c| c.face_up));
    assert_eq!(revealed[0].match_key.as_str(), "cat");
    assert_eq!(revealed[1].match_key.as_str(), "dice");
}

#[test]
fn mismatched_cards_can_be_flipped_again() {
    let session = started_session();
    let s = flip(&session, "alice", 2).unwrap().session;
    let s = flip(&s, "alice", 3).unwrap().session;
    let s = flip(&s, "bob", 2).unwrap().session;
    let outcome = flip(&s, "bob", 4).unwrap();
    assert!(outcome.match_found);
    assert_eq!(outcome.session.player("bob").unwrap().score, 1);
}

#[test]
fn wrong_player_is_forbidden_and_state_unchanged() {
    let session = started_session();
    let before = session.clone();
    let err = flip(&session, "bob", 0).unwrap_err();
    assert_eq!(
        err,
        DomainError::forbidden(ForbiddenKind::NotYourTurn, "it is alice's turn")
    );
    assert_eq!(session, before);
}

#[test]
fn matched_card_cannot_be_flipped() {
    let session = started_session();
    let s = flip(&session, "alice", 0).unwrap().session;
    let s = flip(&s, "alice", 1).unwrap().session;

    let err = flip(&s, "alice", 0).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidCard, _)
    ));
}

#[test]
fn pending_card_cannot_be_flipped_twice() {
    let session = started_session();
    let s = flip(&session, "alice", 5).unwrap().session;
    let err = flip(&s, "alice", 5).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidCard, _)
    ));
}

#[test]
fn out_of_range_card_is_invalid() {
    let err = flip(&started_session(), "alice", 16).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidCard, _)
    ));
}

#[test]
fn join_into_short_handed_non_waiting_session_is_invalid_state() {
    let mut session = waiting_session();
    session.status = SessionStatus::Completed;
    let err = join(&session, Player::new("bob", "Bob")).unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
    assert_eq!(session.players.len(), 1);
}

#[test]
fn corrupt_pending_buffer_is_rejected() {
    let mut session = started_session();
    session.pending_face_up = vec![6, 8];
    session.cards[6].face_up = true;
    session.cards[8].face_up = true;
    let err = flip(&session, "alice", 0).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::TooManyFlipped, _)
    ));
}

#[test]
fn final_match_completes_session() {
    let mut s = started_session();
    for (a, b) in [(0, 1), (6, 7), (8, 9), (10, 11), (12, 13), (14, 15), (2, 4)] {
        s = flip(&s, "alice", a).unwrap().session;
        s = flip(&s, "alice", b).unwrap().session;
        assert_eq!(s.status, SessionStatus::InProgress);
    }
    s = flip(&s, "alice", 3).unwrap().session;
    let outcome = flip(&s, "alice", 5).unwrap();

    assert_eq!(outcome.session.status, SessionStatus::Completed);
    assert!(outcome.session.all_matched());
    assert_eq!(outcome.session.player("alice").unwrap().score, 8);
    assert_eq!(outcome.session.move_count, 8);
    outcome.session.check_invariants().unwrap();

    let err = flip(&outcome.session, "alice", 0).unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[test]
fn session_id_shape_is_checked() {
    use crate::domain::session::validate_session_id;

    assert!(validate_session_id("room-1_A").is_ok());
    assert!(validate_session_id(&"x".repeat(64)).is_ok());
    let too_long = "x".repeat(65);
    for bad in ["", "has space", "slash/y", "emoji-\u{1F600}", too_long.as_str()] {
        let err = validate_session_id(bad).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationKind::InvalidSessionId, _)
        ));
    }
}
