use super::*;

use rinascimento_domain::SessionId;

struct Table {
    state: Arc<WsState>,
    session_id: SessionId,
    master_ws: TestWs,
    player_ws: TestWs,
}

/// One master and one player seated in a fresh session.
async fn seated_table() -> Table {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state.clone()).await;

    let mut master_ws = ws_connect(addr).await;
    let session_id = ws_create_session(&mut master_ws).await;
    ws_send_client(
        &mut master_ws,
        &ClientMessage::JoinAsGameMaster {
            session_id: session_id.clone(),
            player_data: PlayerData::named("Anna"),
        },
    )
    .await;
    let _ = ws_expect_message(&mut master_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerJoined { .. })
    })
    .await;

    let mut player_ws = ws_connect(addr).await;
    ws_send_client(
        &mut player_ws,
        &ClientMessage::JoinAsPlayer {
            session_id: session_id.clone(),
            player_data: PlayerData::named("Bruno"),
        },
    )
    .await;
    let _ = ws_expect_message(&mut player_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerJoined { .. })
    })
    .await;
    let _ = ws_expect_message(&mut master_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerUpdate { .. })
    })
    .await;

    Table {
        state,
        session_id,
        master_ws,
        player_ws,
    }
}

#[tokio::test]
async fn when_dice_rolled_then_logged_and_echoed_to_everyone() {
    let mut t = seated_table().await;
    let payload = json!({"type": "diceRoll", "playerName": "Bruno", "roll": {"total": 15}});

    ws_send_client(
        &mut t.player_ws,
        &ClientMessage::GameStateUpdate(payload.clone()),
    )
    .await;

    for ws in [&mut t.player_ws, &mut t.master_ws] {
        let echoed = ws_expect_message(ws, WAIT, |m| {
            matches!(m, ServerMessage::GameStateUpdate(_))
        })
        .await;
        assert_eq!(echoed, ServerMessage::GameStateUpdate(payload.clone()));
    }

    let session = t.state.app.sessions.lock(&t.session_id).await.unwrap();
    assert_eq!(session.game_log().len(), 1);
    assert!(session.game_log()[0].content.contains("15"));
}

#[tokio::test]
async fn when_player_sends_gm_notes_then_nothing_is_saved() {
    let mut t = seated_table().await;

    ws_send_client(
        &mut t.player_ws,
        &ClientMessage::GmNotesUpdate {
            notes: json!({"secret": "trapdoor"}),
        },
    )
    .await;
    ws_expect_no_message_matching(&mut t.player_ws, QUIET, |m| {
        matches!(m, ServerMessage::GmNotesSaved { .. })
    })
    .await;
    assert!(t
        .state
        .app
        .sessions
        .lock(&t.session_id)
        .await
        .unwrap()
        .gm_notes()
        .is_none());

    ws_send_client(
        &mut t.master_ws,
        &ClientMessage::GmNotesUpdate {
            notes: json!({"secret": "trapdoor"}),
        },
    )
    .await;
    let saved = ws_expect_message(&mut t.master_ws, WAIT, |m| {
        matches!(m, ServerMessage::GmNotesSaved { .. })
    })
    .await;
    assert_eq!(saved, ServerMessage::GmNotesSaved { success: true });
    ws_expect_no_message_matching(&mut t.player_ws, QUIET, |m| {
        matches!(m, ServerMessage::GmNotesSaved { .. })
    })
    .await;
}

#[tokio::test]
async fn when_character_patched_then_others_receive_patch() {
    let mut t = seated_table().await;

    let patch = match json!({"hp": 9}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    ws_send_client(
        &mut t.player_ws,
        &ClientMessage::CharacterUpdate { character: patch },
    )
    .await;

    let relayed = ws_expect_message(&mut t.master_ws, WAIT, |m| {
        matches!(m, ServerMessage::GameStateUpdate(_))
    })
    .await;
    let ServerMessage::GameStateUpdate(payload) = relayed else {
        unreachable!()
    };
    assert_eq!(payload["type"], "characterUpdate");
    assert_eq!(payload["playerName"], "Bruno");
    assert_eq!(payload["character"], json!({"hp": 9}));

    ws_expect_no_message_matching(&mut t.player_ws, QUIET, |m| {
        matches!(m, ServerMessage::GameStateUpdate(_))
    })
    .await;
}

#[tokio::test]
async fn when_asking_for_active_sessions_then_occupied_session_is_listed() {
    let mut t = seated_table().await;

    ws_send_client(&mut t.player_ws, &ClientMessage::GetActiveSessions).await;
    let reply = ws_expect_message(&mut t.player_ws, WAIT, |m| {
        matches!(m, ServerMessage::ActiveSessions { .. })
    })
    .await;

    let ServerMessage::ActiveSessions { sessions } = reply else {
        unreachable!()
    };
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, t.session_id);
    assert_eq!(sessions[0].online_player_count, 2);
    assert!(sessions[0].has_master);
}

#[tokio::test]
async fn heartbeat_and_ack_are_answered() {
    let mut t = seated_table().await;

    ws_send_client(&mut t.player_ws, &ClientMessage::Heartbeat).await;
    let _ = ws_expect_message(&mut t.player_ws, WAIT, |m| {
        matches!(m, ServerMessage::HeartbeatAck { .. })
    })
    .await;

    ws_send_client(
        &mut t.player_ws,
        &ClientMessage::MessageAck {
            message_id: json!("m-42"),
        },
    )
    .await;
    let ack = ws_expect_message(&mut t.player_ws, WAIT, |m| {
        matches!(m, ServerMessage::MessageAck { .. })
    })
    .await;
    assert_eq!(
        ack,
        ServerMessage::MessageAck {
            message_id: json!("m-42")
        }
    );
}
