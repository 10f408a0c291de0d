// Concurrent writers against one session: compare-and-swap retries, the
// retry budget, and no lost updates.

use std::sync::Arc;

use matchroom::domain::{Player, SessionStatus};
use matchroom::errors::domain::{ConflictKind, DomainError, ValidationKind};
use matchroom::services::{SessionCoordinator, DEFAULT_MAX_RETRIES};

use crate::support::doubles::{ContendedStore, RecordingGateway};
use crate::support::fixtures::{
    coordinator_with, guest, host, local_coordinator, matching_pair, mismatched_pair,
    started_session, HOST,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_fill_exactly_one_seat() {
    let (coordinator, _hub) = local_coordinator();
    coordinator
        .create_session(host(), Some("race".into()), Some(4))
        .await
        .unwrap();

    let contenders: Vec<_> = (0..2)
        .map(|i| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .join_session("race", Player::new(format!("p{i}"), format!("P{i}")))
                    .await
            })
        })
        .collect();

    let mut seated = 0;
    let mut turned_away = 0;
    for handle in contenders {
        match handle.await.unwrap() {
            Ok(result) => {
                assert!(result.joined && result.started);
                seated += 1;
            }
            Err(DomainError::Capacity(_)) => turned_away += 1,
            Err(other) => panic!("unexpected join error: {other}"),
        }
    }

    assert_eq!((seated, turned_away), (1, 1));
    let session = coordinator.get_session("race").await.unwrap();
    assert_eq!(session.players.len(), 2);
    assert_eq!(session.status, SessionStatus::InProgress);
    assert_eq!(session.version, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_card_flipped_twice_concurrently_counts_once() {
    let (coordinator, _hub) = local_coordinator();
    started_session(&coordinator, "race", 4).await;

    let flips: Vec<_> = (0..2)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.request_move("race", HOST, 0).await })
        })
        .collect();

    let mut ok = 0;
    let mut rejected = 0;
    for handle in flips {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(DomainError::Validation(ValidationKind::InvalidCard, _)) => rejected += 1,
            Err(other) => panic!("unexpected move error: {other}"),
        }
    }

    assert_eq!((ok, rejected), (1, 1));
    let session = coordinator.get_session("race").await.unwrap();
    assert_eq!(session.pending_face_up, vec![0]);
    assert_eq!(session.version, 3);
    session.check_invariants().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_flips_of_a_pair_resolve_once() {
    let (coordinator, _hub) = local_coordinator();
    let session = started_session(&coordinator, "race", 4).await;
    let (a, b) = matching_pair(&session);

    let flips: Vec<_> = [a, b]
        .into_iter()
        .map(|card| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.request_move("race", HOST, card).await })
        })
        .collect();

    let mut resolutions = 0;
    for handle in flips {
        let result = handle.await.unwrap().expect("both flips land after a retry");
        if result.resolved {
            resolutions += 1;
        }
    }

    assert_eq!(resolutions, 1);
    let session = coordinator.get_session("race").await.unwrap();
    assert_eq!(session.move_count, 1);
    assert_eq!(session.player(HOST).unwrap().score, 1);
    assert_eq!(session.version, 4);
    session.check_invariants().unwrap();
}

#[tokio::test]
async fn stale_mover_is_rejected_after_turn_passes() {
    let (coordinator, _hub) = local_coordinator();
    let session = started_session(&coordinator, "race", 4).await;
    let (a, b) = mismatched_pair(&session);

    coordinator.request_move("race", HOST, a).await.unwrap();
    coordinator.request_move("race", HOST, b).await.unwrap();

    // The host kept a stale view and fires again; the turn is already gone.
    let err = coordinator.request_move("race", HOST, a).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_, _)));
}

fn contended(conflicts: u32, max_retries: u32) -> (SessionCoordinator, Arc<ContendedStore>) {
    let store = Arc::new(ContendedStore::new(conflicts));
    let coordinator = SessionCoordinator::new(
        store.clone(),
        Arc::new(RecordingGateway::new()),
        max_retries,
        4,
    );
    (coordinator, store)
}

#[tokio::test]
async fn retries_until_the_write_lands() {
    let (coordinator, store) = contended(2, DEFAULT_MAX_RETRIES);
    coordinator
        .create_session(host(), Some("busy".into()), None)
        .await
        .unwrap();

    let result = coordinator.join_session("busy", guest()).await.unwrap();

    assert!(result.started);
    assert_eq!(result.session.version, 2);
    assert_eq!(store.cas_calls(), 3);
}

#[tokio::test]
async fn gives_up_after_retry_budget() {
    let (coordinator, store) = contended(u32::MAX, DEFAULT_MAX_RETRIES);
    coordinator
        .create_session(host(), Some("busy".into()), None)
        .await
        .unwrap();

    let err = coordinator.join_session("busy", guest()).await.unwrap_err();

    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::TooManyRetries, _)
    ));
    assert_eq!(store.cas_calls(), 1 + DEFAULT_MAX_RETRIES);
    let stored = coordinator.get_session("busy").await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.players.len(), 1);
}

#[tokio::test]
async fn zero_retry_budget_tries_once() {
    let (coordinator, store) = contended(1, 0);
    coordinator
        .create_session(host(), Some("busy".into()), None)
        .await
        .unwrap();

    let err = coordinator.join_session("busy", guest()).await.unwrap_err();

    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::TooManyRetries, _)
    ));
    assert_eq!(store.cas_calls(), 1);
}

#[tokio::test]
async fn failed_attempts_publish_nothing() {
    let store = Arc::new(ContendedStore::always());
    let gateway = Arc::new(RecordingGateway::new());
    let coordinator = coordinator_with(store, gateway.clone());
    coordinator
        .create_session(host(), Some("busy".into()), None)
        .await
        .unwrap();

    coordinator.join_session("busy", guest()).await.unwrap_err();

    assert!(gateway.published().is_empty());
}
