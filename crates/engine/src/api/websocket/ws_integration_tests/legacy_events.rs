use super::*;

fn ack_response(msg: &ServerMessage, expected: &str) -> Option<serde_json::Value> {
    match msg {
        ServerMessage::Ack {
            request_id,
            response,
        } if request_id == expected => Some(response.clone()),
        _ => None,
    }
}

#[tokio::test]
async fn legacy_host_and_guest_flow() {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state.clone()).await;

    let mut host_ws = ws_connect(addr).await;
    ws_send_raw(
        &mut host_ws,
        json!({"event": "create_session", "data": {"requestId": "c1", "playerName": "Anna"}}),
    )
    .await;
    let reply = ws_expect_message(&mut host_ws, WAIT, |m| ack_response(m, "c1").is_some()).await;
    let created = ack_response(&reply, "c1").unwrap();
    assert_eq!(created["success"], true);
    assert_eq!(created["player"]["isMaster"], true);
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    let mut guest_ws = ws_connect(addr).await;
    ws_send_raw(
        &mut guest_ws,
        json!({
            "event": "join_session",
            "data": {
                "requestId": "j1",
                "sessionId": session_id,
                "playerName": "Bruno",
                "wantsToBeMaster": true
            }
        }),
    )
    .await;
    let reply = ws_expect_message(&mut guest_ws, WAIT, |m| ack_response(m, "j1").is_some()).await;
    let joined = ack_response(&reply, "j1").unwrap();
    assert_eq!(joined["success"], true);
    assert_eq!(joined["player"]["isMaster"], false);
    assert_eq!(joined["players"].as_array().unwrap().len(), 2);

    let announced = ws_expect_message(&mut host_ws, WAIT, |m| {
        matches!(m, ServerMessage::LegacyPlayerJoined { .. })
    })
    .await;
    assert!(matches!(
        announced,
        ServerMessage::LegacyPlayerJoined { player } if player.name() == "Bruno"
    ));

    ws_send_raw(
        &mut guest_ws,
        json!({"event": "game_message", "data": {"requestId": "g1", "message": "Salve!"}}),
    )
    .await;
    let relayed = ws_expect_message(&mut host_ws, WAIT, |m| {
        matches!(m, ServerMessage::LegacyGameMessage(_))
    })
    .await;
    assert!(matches!(
        relayed,
        ServerMessage::LegacyGameMessage(payload) if payload["message"] == "Salve!"
    ));
    let reply = ws_expect_message(&mut guest_ws, WAIT, |m| ack_response(m, "g1").is_some()).await;
    assert_eq!(ack_response(&reply, "g1").unwrap()["success"], true);

    ws_send_raw(
        &mut guest_ws,
        json!({"event": "update_player", "data": {"requestId": "u1", "characterName": "Cesare", "isMaster": true}}),
    )
    .await;
    let reply = ws_expect_message(&mut guest_ws, WAIT, |m| ack_response(m, "u1").is_some()).await;
    let updated = ack_response(&reply, "u1").unwrap();
    assert_eq!(updated["player"]["characterName"], "Cesare");
    assert_eq!(updated["player"]["isMaster"], false);

    let _ = ws_expect_message(&mut host_ws, WAIT, |m| {
        matches!(m, ServerMessage::LegacyPlayerUpdated { player } if player.character_name() == "Cesare")
    })
    .await;

    let session_id = rinascimento_domain::SessionId::from_client(session_id);
    let session = state.app.sessions.lock(&session_id).await.unwrap();
    assert_eq!(session.game_log().len(), 1);
    assert_eq!(session.game_log()[0].author, "Bruno");
}

#[tokio::test]
async fn legacy_join_of_missing_session_acks_failure() {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state).await;
    let mut ws = ws_connect(addr).await;

    ws_send_raw(
        &mut ws,
        json!({
            "event": "join_session",
            "data": {"requestId": "j9", "sessionId": "rinascimento-nowhere", "playerName": "Zoe"}
        }),
    )
    .await;

    let reply = ws_expect_message(&mut ws, WAIT, |m| ack_response(m, "j9").is_some()).await;
    assert_eq!(
        ack_response(&reply, "j9").unwrap(),
        json!({"success": false, "error": "Session not found"})
    );
}
