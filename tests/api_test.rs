mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

async fn send(app: &TestApp, from: &str, to: &str, body: &str) -> (StatusCode, serde_json::Value) {
    app.request(
        Method::POST,
        "/api/messages",
        Some(from),
        Some(json!({ "recipient_id": to, "subject": "Deal", "body": body })),
    )
    .await
}

#[tokio::test]
async fn health_check_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(Method::GET, "/api/conversations", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "auth_error");
}

#[tokio::test]
async fn tokens_for_deleted_users_are_rejected() {
    let app = TestApp::new().await;
    let (status, _) = app
        .request(Method::GET, "/api/conversations", Some("ghost"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tokens_with_separator_in_subject_are_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(Method::GET, "/api/conversations", Some("sam_ivy"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token subject");
}

#[tokio::test]
async fn sent_message_appears_in_both_thread_lists() {
    let app = TestApp::new().await;

    let (status, sent) = send(&app, "sam", "ivy", "Interested in the round?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["conversation_id"], "ivy_sam");
    assert_eq!(sent["message_type"], "sales_professional_to_investor");
    assert_eq!(sent["is_read_by_receiver"], false);
    assert!(sent["timestamp"].is_string());

    let (status, threads) = app
        .request(Method::GET, "/api/conversations", Some("ivy"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let threads = threads.as_array().unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["id"], "ivy_sam");
    assert_eq!(threads[0]["unread_count"], 1);
    assert_eq!(threads[0]["last_snippet"], "Interested in the round?");

    let (_, threads) = app
        .request(Method::GET, "/api/conversations", Some("sam"), None)
        .await;
    assert_eq!(threads[0]["unread_count"], 0);
}

#[tokio::test]
async fn marking_a_thread_read_reports_the_count() {
    let app = TestApp::new().await;
    send(&app, "sam", "ivy", "one").await;
    send(&app, "sam", "ivy", "two").await;

    let (status, body) = app
        .request(Method::POST, "/api/conversations/ivy_sam/read", Some("ivy"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marked"], 2);

    let (_, body) = app
        .request(Method::POST, "/api/conversations/ivy_sam/read", Some("ivy"), None)
        .await;
    assert_eq!(body["marked"], 0);

    let (_, threads) = app
        .request(Method::GET, "/api/conversations", Some("ivy"), None)
        .await;
    assert_eq!(threads[0]["unread_count"], 0);
}

#[tokio::test]
async fn thread_messages_are_oldest_first_and_private() {
    let app = TestApp::new().await;
    send(&app, "sam", "ivy", "first").await;
    send(&app, "ivy", "sam", "second").await;

    let (status, messages) = app
        .request(Method::GET, "/api/conversations/ivy_sam/messages", Some("sam"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let bodies: Vec<&str> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["first", "second"]);

    let (status, body) = app
        .request(Method::GET, "/api/conversations/ivy_sam/messages", Some("acme"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = app
        .request(Method::GET, "/api/conversations/acme_ivy/messages", Some("ivy"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_errors_map_to_status_codes() {
    let app = TestApp::new().await;

    let (status, body) = send(&app, "sam", "ghost", "hello").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Recipient not found");

    let (status, body) = send(&app, "sam", "ivy", "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(&app, "sam", "b_c", "hello").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(&app, "sam", "sam", "hello me").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    app.store.set_fail_writes(true);
    let (status, body) = send(&app, "sam", "ivy", "hello").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "send_failed");
}

#[tokio::test]
async fn blocking_is_visible_to_both_sides() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::POST, "/api/users/sam/block", Some("ivy"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocked_users"], json!(["sam"]));

    let (status, body) = send(&app, "sam", "ivy", "hello?").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "blocked_by_recipient");
    assert_eq!(body["message"], "You have been blocked by the recipient");

    let (status, body) = send(&app, "ivy", "sam", "hello?").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "blocked_by_you");

    let (_, body) = app
        .request(Method::GET, "/api/users/ivy/block-state", Some("sam"), None)
        .await;
    assert_eq!(body["state"], "blocked_by_counterparty");
    assert_eq!(body["can_compose"], false);
    assert_eq!(body["notice"], "You have been blocked by the recipient");

    let (_, body) = app
        .request(Method::GET, "/api/users/sam/block-state", Some("ivy"), None)
        .await;
    assert_eq!(body["state"], "blocked_by_self");
    assert_eq!(body["notice"], "You have blocked this user");

    let (status, body) = app
        .request(Method::DELETE, "/api/users/sam/block", Some("ivy"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocked_users"], json!([]));

    let (_, body) = app
        .request(Method::GET, "/api/users/ivy/block-state", Some("sam"), None)
        .await;
    assert_eq!(body["state"], "open");
    assert_eq!(body["can_compose"], true);
    assert!(body["notice"].is_null());

    let (status, _) = send(&app, "sam", "ivy", "hello again").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn block_state_for_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .request(Method::GET, "/api/users/ghost/block-state", Some("sam"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = TestApp::new().await;
    send(&app, "sam", "ivy", "hi").await;

    let (status, _) = app
        .request(Method::GET, "/api/admin/conversations", Some("sam"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::DELETE, "/api/admin/conversations/ivy_sam", Some("ivy"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_can_review_and_soft_delete() {
    let app = TestApp::new().await;
    send(&app, "sam", "ivy", "hi").await;
    send(&app, "acme", "sam", "proposal").await;

    let (status, body) = app
        .request(Method::GET, "/api/admin/conversations", Some("root"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (status, body) = app
        .request(Method::DELETE, "/api/admin/conversations/ivy_sam", Some("root"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["flagged"], 1);

    let (_, threads) = app
        .request(Method::GET, "/api/conversations", Some("ivy"), None)
        .await;
    assert_eq!(threads, json!([]));

    let (status, messages) = app
        .request(
            Method::GET,
            "/api/admin/conversations/ivy_sam/messages",
            Some("root"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages[0]["is_deleted_by_admin"], true);

    let (_, body) = app
        .request(Method::GET, "/api/admin/conversations", Some("root"), None)
        .await;
    let flagged = body["conversations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == "ivy_sam")
        .unwrap();
    assert_eq!(flagged["has_deleted_messages"], true);

    let (status, _) = app
        .request(Method::DELETE, "/api/admin/conversations/nobody_none", Some("root"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
