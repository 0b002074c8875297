mod common;

use common::TestApp;
use common::ws_helpers::{
    recv_conversations_where, recv_json, recv_type, send_json, start_server, ws_connect,
};
use dealroom::services::block_gate::block_user;
use dealroom::services::composer::{Draft, compose_message};
use dealroom::store::MessageStore;
use serde_json::json;

#[tokio::test]
async fn connect_greets_then_pushes_thread_list() {
    let app = TestApp::new().await;
    let base = start_server(&app).await;

    let mut ws = ws_connect(&base, &app.token("sam")).await;
    let greeting = recv_json(&mut ws).await.unwrap();
    assert_eq!(greeting, json!({ "type": "connected", "user_id": "sam" }));

    let inbox = recv_type(&mut ws, "conversations").await;
    assert_eq!(inbox["threads"], json!([]));
    assert_eq!(inbox["total_unread"], 0);
}

#[tokio::test]
async fn connect_with_bad_token_is_refused() {
    let app = TestApp::new().await;
    let base = start_server(&app).await;

    let url = format!("{}/api/ws?token=not-a-token", base);
    assert!(tokio_tungstenite::connect_async(&url).await.is_err());

    let url = format!("{}/api/ws?token={}", base, app.token("ghost"));
    assert!(tokio_tungstenite::connect_async(&url).await.is_err());
}

#[tokio::test]
async fn heartbeat_is_answered_with_pong() {
    let app = TestApp::new().await;
    let base = start_server(&app).await;
    let mut ws = ws_connect(&base, &app.token("sam")).await;
    recv_type(&mut ws, "connected").await;

    send_json(&mut ws, &json!({ "type": "heartbeat" })).await;
    recv_type(&mut ws, "pong").await;
}

#[tokio::test]
async fn unknown_messages_get_an_error_reply() {
    let app = TestApp::new().await;
    let base = start_server(&app).await;
    let mut ws = ws_connect(&base, &app.token("sam")).await;

    send_json(&mut ws, &json!({ "type": "typing" })).await;
    let reply = recv_type(&mut ws, "error").await;
    assert_eq!(reply["message"], "Unrecognized message");
}

#[tokio::test]
async fn new_messages_are_pushed_to_the_recipient() {
    let app = TestApp::new().await;
    let base = start_server(&app).await;
    let mut ws = ws_connect(&base, &app.token("ivy")).await;
    recv_type(&mut ws, "conversations").await;

    let sam = common::session(&common::sales());
    compose_message(app.store.as_ref(), &sam, "ivy", &Draft::new("Intro", "hello"))
        .await
        .unwrap();

    let pushed = recv_conversations_where(&mut ws, |m| m["total_unread"] == 1).await;
    assert_eq!(pushed["threads"][0]["id"], "ivy_sam");
    assert_eq!(pushed["threads"][0]["last_snippet"], "hello");
}

#[tokio::test]
async fn opening_a_thread_reports_block_state_and_clears_unread() {
    let app = TestApp::new().await;
    let sam = common::session(&common::sales());
    compose_message(app.store.as_ref(), &sam, "ivy", &Draft::new("", "one"))
        .await
        .unwrap();
    compose_message(app.store.as_ref(), &sam, "ivy", &Draft::new("", "two"))
        .await
        .unwrap();

    let base = start_server(&app).await;
    let mut ws = ws_connect(&base, &app.token("ivy")).await;
    recv_conversations_where(&mut ws, |m| m["total_unread"] == 2).await;

    send_json(
        &mut ws,
        &json!({ "type": "open_thread", "conversation_id": "ivy_sam", "counterparty_id": "sam" }),
    )
    .await;

    // The reply and the refreshed thread list race each other.
    let mut opened = None;
    let mut cleared = false;
    while opened.is_none() || !cleared {
        let msg = recv_json(&mut ws).await.expect("websocket went quiet");
        match msg["type"].as_str() {
            Some("thread_opened") => opened = Some(msg),
            Some("conversations") if msg["total_unread"] == 0 => cleared = true,
            _ => {}
        }
    }

    let opened = opened.unwrap();
    assert_eq!(opened["conversation_id"], "ivy_sam");
    assert_eq!(opened["block_state"], "open");
    assert!(opened["notice"].is_null());

    let messages = app.store.messages_for_participant("ivy").await.unwrap();
    assert!(messages.iter().all(|m| m.is_read_by_receiver));
}

#[tokio::test]
async fn opening_a_thread_with_a_blocker_shows_the_notice() {
    let app = TestApp::new().await;
    let ivy = common::session(&common::investor());
    block_user(app.store.as_ref(), &ivy, "sam").await.unwrap();

    let base = start_server(&app).await;
    let mut ws = ws_connect(&base, &app.token("sam")).await;
    recv_type(&mut ws, "connected").await;

    send_json(
        &mut ws,
        &json!({ "type": "open_thread", "conversation_id": "ivy_sam", "counterparty_id": "ivy" }),
    )
    .await;

    let opened = recv_type(&mut ws, "thread_opened").await;
    assert_eq!(opened["block_state"], "blocked_by_counterparty");
    assert_eq!(opened["notice"], "You have been blocked by the recipient");
}

#[tokio::test]
async fn opening_someone_elses_thread_is_refused() {
    let app = TestApp::new().await;
    let sam = common::session(&common::sales());
    compose_message(app.store.as_ref(), &sam, "ivy", &Draft::new("", "private"))
        .await
        .unwrap();

    let base = start_server(&app).await;
    let mut ws = ws_connect(&base, &app.token("acme")).await;
    recv_type(&mut ws, "connected").await;

    send_json(
        &mut ws,
        &json!({ "type": "open_thread", "conversation_id": "ivy_sam", "counterparty_id": "sam" }),
    )
    .await;

    let reply = recv_type(&mut ws, "error").await;
    assert_eq!(reply["message"], "You are not part of this conversation");

    let messages = app.store.messages_for_participant("ivy").await.unwrap();
    assert!(!messages[0].is_read_by_receiver);
}
