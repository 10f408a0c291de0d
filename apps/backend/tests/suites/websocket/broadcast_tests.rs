// Committed transitions reach connected clients as versioned events;
// events already covered by the snapshot are dropped.

use std::time::Duration;

use matchroom::realtime::{topic_for, BroadcastGateway, SessionEvent};

use crate::support::fixtures::{
    build_test_state_with_hub, guest, host, matching_pair, mismatched_pair, started_session,
    GUEST, HOST,
};
use crate::support::websocket::{session_ws_url, start_test_server, wait_for_subscribers};
use crate::support::websocket_client::WebSocketClient;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn join_is_streamed_as_player_joined_then_game_started(
) -> Result<(), Box<dyn std::error::Error>> {
    let (state, hub) = build_test_state_with_hub().await;
    let coordinator = state.coordinator.clone();
    coordinator
        .create_session(host(), Some("ws-join".into()), Some(2))
        .await?;

    let (server_handle, addr, server_join) = start_test_server(state).await?;
    let mut client =
        WebSocketClient::connect_retry(&session_ws_url(addr, "ws-join"), Duration::from_secs(1))
            .await?;
    client.handshake(WAIT).await?;
    wait_for_subscribers(&hub, &topic_for("ws-join"), 1, WAIT).await?;

    coordinator.join_session("ws-join", guest()).await?;

    let joined = client.expect_json(WAIT).await?;
    assert_eq!(joined["type"], "event");
    assert_eq!(joined["name"], "player-joined");
    assert_eq!(joined["version"], 2);
    assert_eq!(joined["payload"]["player"]["id"], GUEST);

    let started = client.expect_json(WAIT).await?;
    assert_eq!(started["name"], "game-started");
    assert_eq!(started["version"], 2);
    assert_eq!(started["payload"]["session"]["status"], "in-progress");

    client.close().await?;
    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn flips_stream_card_flipped_then_match_result() -> Result<(), Box<dyn std::error::Error>> {
    let (state, hub) = build_test_state_with_hub().await;
    let coordinator = state.coordinator.clone();
    let session = started_session(&coordinator, "ws-flip", 3).await;
    let (a, b) = mismatched_pair(&session);

    let (server_handle, addr, server_join) = start_test_server(state).await?;
    let mut client =
        WebSocketClient::connect_retry(&session_ws_url(addr, "ws-flip"), Duration::from_secs(1))
            .await?;
    client.handshake(WAIT).await?;
    wait_for_subscribers(&hub, &topic_for("ws-flip"), 1, WAIT).await?;

    coordinator.request_move("ws-flip", HOST, a).await?;
    coordinator.request_move("ws-flip", HOST, b).await?;

    let flipped = client.expect_json(WAIT).await?;
    assert_eq!(flipped["name"], "card-flipped");
    assert_eq!(flipped["version"], 3);
    assert_eq!(flipped["payload"]["cardId"], a);
    assert_eq!(flipped["payload"]["playerId"], HOST);
    assert_eq!(flipped["payload"]["session"]["cards"][a]["faceUp"], true);

    let result = client.expect_json(WAIT).await?;
    assert_eq!(result["name"], "match-result");
    assert_eq!(result["version"], 4);
    let payload = &result["payload"];
    assert_eq!(payload["matchFound"], false);
    assert_eq!(payload["turnSwitched"], true);
    assert_eq!(payload["firstCardId"], a);
    assert_eq!(payload["secondCardId"], b);
    assert_eq!(payload["revealed"][0]["faceUp"], true);
    assert_eq!(payload["revealed"][1]["faceUp"], true);
    assert_eq!(payload["session"]["cards"][a]["faceUp"], false);
    assert_eq!(payload["session"]["currentTurnPlayerId"], GUEST);

    client.close().await?;
    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn events_older_than_the_snapshot_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let (state, hub) = build_test_state_with_hub().await;
    let coordinator = state.coordinator.clone();
    let waiting = coordinator
        .create_session(host(), Some("ws-stale".into()), Some(2))
        .await?;
    let started = coordinator.join_session("ws-stale", guest()).await?.session;
    let topic = topic_for("ws-stale");

    let (server_handle, addr, server_join) = start_test_server(state).await?;
    let mut client =
        WebSocketClient::connect_retry(&session_ws_url(addr, "ws-stale"), Duration::from_secs(1))
            .await?;
    let snapshot = client.handshake(WAIT).await?;
    assert_eq!(snapshot["version"], started.version);
    wait_for_subscribers(&hub, &topic, 1, WAIT).await?;

    // A delayed delivery of something the snapshot already contains.
    hub.publish(&topic, SessionEvent::GameStarted { session: waiting })
        .await?;
    hub.publish(
        &topic,
        SessionEvent::GameStarted {
            session: started.clone(),
        },
    )
    .await?;

    let (a, b) = matching_pair(&started);
    coordinator.request_move("ws-stale", HOST, a).await?;
    coordinator.request_move("ws-stale", HOST, b).await?;

    let first = client.expect_json(WAIT).await?;
    assert_eq!(first["name"], "card-flipped", "stale events must not be forwarded");
    assert_eq!(first["version"], 3);

    let second = client.expect_json(WAIT).await?;
    assert_eq!(second["name"], "match-result");
    assert_eq!(second["payload"]["matchFound"], true);

    client.close().await?;
    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn every_subscriber_gets_the_same_stream() -> Result<(), Box<dyn std::error::Error>> {
    let (state, hub) = build_test_state_with_hub().await;
    let coordinator = state.coordinator.clone();
    let session = started_session(&coordinator, "ws-fan", 2).await;
    let topic = topic_for("ws-fan");

    let (server_handle, addr, server_join) = start_test_server(state).await?;
    let url = session_ws_url(addr, "ws-fan");
    let mut alice = WebSocketClient::connect_retry(&url, Duration::from_secs(1)).await?;
    let mut bob = WebSocketClient::connect_retry(&url, Duration::from_secs(1)).await?;
    alice.handshake(WAIT).await?;
    bob.handshake(WAIT).await?;
    wait_for_subscribers(&hub, &topic, 2, WAIT).await?;

    let (a, _) = matching_pair(&session);
    coordinator.request_move("ws-fan", HOST, a).await?;

    for client in [&mut alice, &mut bob] {
        let event = client.expect_json(WAIT).await?;
        assert_eq!(event["name"], "card-flipped");
        assert_eq!(event["version"], 3);
    }

    alice.close().await?;
    bob.close().await?;
    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}
