use super::*;

#[tokio::test]
async fn when_session_created_then_id_is_prefixed_and_listed() {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state.clone()).await;
    let mut ws = ws_connect(addr).await;

    let session_id = ws_create_session(&mut ws).await;

    assert!(session_id.as_str().starts_with("rinascimento-"));
    let overview = state.app.sessions.overview().await;
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].id, session_id);
    assert_eq!(overview[0].total_players, 0);
}

#[tokio::test]
async fn when_master_joins_then_room_is_told_and_second_master_is_refused() {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state.clone()).await;

    let mut master_ws = ws_connect(addr).await;
    let mut observer_ws = ws_connect(addr).await;
    let mut rival_ws = ws_connect(addr).await;

    let session_id = ws_create_session(&mut master_ws).await;

    // Observer attaches first so it sees the master's arrival.
    ws_send_client(
        &mut observer_ws,
        &ClientMessage::JoinSession {
            session_id: session_id.clone(),
        },
    )
    .await;
    let _ = ws_expect_message(&mut observer_ws, WAIT, |m| {
        matches!(m, ServerMessage::JoinedSession { .. })
    })
    .await;

    ws_send_client(
        &mut master_ws,
        &ClientMessage::JoinAsGameMaster {
            session_id: session_id.clone(),
            player_data: PlayerData::named("Anna"),
        },
    )
    .await;

    let joined = ws_expect_message(&mut master_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerJoined { .. })
    })
    .await;
    let ServerMessage::PlayerJoined {
        player_id,
        is_master,
        ..
    } = joined
    else {
        unreachable!()
    };
    assert!(is_master);

    let update = ws_expect_message(&mut observer_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerUpdate { .. })
    })
    .await;
    assert!(matches!(
        update,
        ServerMessage::PlayerUpdate { player } if player.id() == player_id && player.name() == "Anna"
    ));

    ws_send_client(
        &mut rival_ws,
        &ClientMessage::JoinAsGameMaster {
            session_id: session_id.clone(),
            player_data: PlayerData::named("Bruno"),
        },
    )
    .await;
    let refused = ws_expect_message(&mut rival_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionError { .. })
    })
    .await;
    assert!(matches!(
        refused,
        ServerMessage::SessionError {
            code: ErrorCode::MasterAlreadyPresent,
            ..
        }
    ));

    // Nobody hears about the refused attempt.
    ws_expect_no_message_matching(&mut observer_ws, QUIET, |m| {
        matches!(m, ServerMessage::PlayerUpdate { .. })
    })
    .await;
}

#[tokio::test]
async fn when_player_reconnects_then_rejoin_restores_same_record() {
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
    let ServerMessage::PlayerJoined { player_id, .. } =
        ws_expect_message(&mut player_ws, WAIT, |m| {
            matches!(m, ServerMessage::PlayerJoined { .. })
        })
        .await
    else {
        unreachable!()
    };

    // Drop the socket; the master sees the player go offline.
    player_ws.close(None).await.unwrap();
    drop(player_ws);

    let offline = ws_expect_message(&mut master_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerUpdate { player } if !player.is_online())
    })
    .await;
    assert!(matches!(offline, ServerMessage::PlayerUpdate { player } if player.id() == player_id));
    let _ = ws_expect_message(&mut master_ws, WAIT, |m| {
        matches!(m, ServerMessage::LegacyPlayerDisconnected { player_name, .. } if player_name == "Bruno")
    })
    .await;

    let mut returning_ws = ws_connect(addr).await;
    ws_send_client(
        &mut returning_ws,
        &ClientMessage::RejoinSession {
            session_id: session_id.clone(),
            player_id: player_id.to_string(),
        },
    )
    .await;
    let rejoined = ws_expect_message(&mut returning_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerJoined { .. })
    })
    .await;
    assert!(matches!(
        rejoined,
        ServerMessage::PlayerJoined { player_id: id, player_data, is_master: false }
            if id == player_id && player_data.is_online()
    ));

    let _ = ws_expect_message(&mut master_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerUpdate { player } if player.is_online() && player.id() == player_id)
    })
    .await;

    let session = state.app.sessions.lock(&session_id).await.unwrap();
    assert_eq!(session.player_count(), 2);
    assert!(session.player(player_id).unwrap().is_online());
}

#[tokio::test]
async fn when_rejoining_unknown_player_then_rejoin_fails() {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state).await;
    let mut ws = ws_connect(addr).await;
    let session_id = ws_create_session(&mut ws).await;

    ws_send_client(
        &mut ws,
        &ClientMessage::RejoinSession {
            session_id,
            player_id: uuid::Uuid::new_v4().to_string(),
        },
    )
    .await;

    let reply = ws_expect_message(&mut ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionError { .. })
    })
    .await;
    assert!(matches!(
        reply,
        ServerMessage::SessionError {
            code: ErrorCode::RejoinFailed,
            ..
        }
    ));
}

#[tokio::test]
async fn when_frame_is_garbage_then_invalid_message_error() {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state).await;
    let mut ws = ws_connect(addr).await;

    ws_send_raw(&mut ws, json!({"event": "teleport", "data": {}})).await;

    let reply = ws_expect_message(&mut ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionError { .. })
    })
    .await;
    assert!(matches!(
        reply,
        ServerMessage::SessionError {
            code: ErrorCode::InvalidMessage,
            ..
        }
    ));

    // The connection survives a bad frame.
    ws_send_client(&mut ws, &ClientMessage::Ping).await;
    let _ = ws_expect_message(&mut ws, WAIT, |m| matches!(m, ServerMessage::Pong)).await;
}

#[tokio::test]
async fn when_payloadless_event_carries_empty_object_then_it_is_handled() {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state).await;
    let mut ws = ws_connect(addr).await;

    ws_send_raw(&mut ws, json!({"event": "createSession", "data": {}})).await;
    let created = ws_expect_message(&mut ws, WAIT, |m| {
        matches!(
            m,
            ServerMessage::SessionCreated { .. } | ServerMessage::SessionError { .. }
        )
    })
    .await;
    assert!(matches!(created, ServerMessage::SessionCreated { success: true, .. }));

    ws_send_raw(&mut ws, json!({"event": "ping", "data": {}})).await;
    let _ = ws_expect_message(&mut ws, WAIT, |m| matches!(m, ServerMessage::Pong)).await;
}

#[tokio::test]
async fn when_stale_socket_closes_after_rejoin_then_master_stays_online() {
    let state = build_test_state(chrono::Utc::now());
    let (addr, _server) = spawn_ws_server(state.clone()).await;

    let mut old_ws = ws_connect(addr).await;
    let session_id = ws_create_session(&mut old_ws).await;
    ws_send_client(
        &mut old_ws,
        &ClientMessage::JoinAsGameMaster {
            session_id: session_id.clone(),
            player_data: PlayerData::named("Anna"),
        },
    )
    .await;
    let ServerMessage::PlayerJoined { player_id, .. } =
        ws_expect_message(&mut old_ws, WAIT, |m| {
            matches!(m, ServerMessage::PlayerJoined { .. })
        })
        .await
    else {
        unreachable!()
    };

    let mut new_ws = ws_connect(addr).await;
    ws_send_client(
        &mut new_ws,
        &ClientMessage::RejoinSession {
            session_id: session_id.clone(),
            player_id: player_id.to_string(),
        },
    )
    .await;
    let _ = ws_expect_message(&mut new_ws, WAIT, |m| {
        matches!(m, ServerMessage::PlayerJoined { .. })
    })
    .await;

    old_ws.close(None).await.unwrap();
    drop(old_ws);
    let deadline = tokio::time::Instant::now() + WAIT;
    while state.connections.len() > 1 {
        assert!(tokio::time::Instant::now() < deadline, "old socket never cleaned up");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    ws_expect_no_message_matching(&mut new_ws, QUIET, |m| {
        matches!(m, ServerMessage::PlayerUpdate { player } if !player.is_online())
    })
    .await;
    {
        let session = state.app.sessions.lock(&session_id).await.unwrap();
        assert!(session.player(player_id).unwrap().is_live_master());
    }

    let mut rival_ws = ws_connect(addr).await;
    ws_send_client(
        &mut rival_ws,
        &ClientMessage::JoinAsGameMaster {
            session_id: session_id.clone(),
            player_data: PlayerData::named("Bruno"),
        },
    )
    .await;
    let refused = ws_expect_message(&mut rival_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionError { .. })
    })
    .await;
    assert!(matches!(
        refused,
        ServerMessage::SessionError {
            code: ErrorCode::MasterAlreadyPresent,
            ..
        }
    ));
}
