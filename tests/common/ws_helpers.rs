#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serves the app's router on a random local port and returns the base URL.
pub async fn start_server(app: &super::TestApp) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("ws://127.0.0.1:{}", addr.port())
}

pub async fn ws_connect(base: &str, token: &str) -> WsClient {
    let url = format!("{}/api/ws?token={}", base, token);
    let (ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    ws
}

/// Next text frame as JSON, or `None` after three seconds.
pub async fn recv_json(ws: &mut WsClient) -> Option<Value> {
    loop {
        match tokio::time::timeout(Duration::from_secs(3), ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => return serde_json::from_str(&text).ok(),
            Ok(Some(Ok(_))) => continue,
            _ => return None,
        }
    }
}

/// Skips frames until one with the given `type` arrives.
pub async fn recv_type(ws: &mut WsClient, event_type: &str) -> Value {
    loop {
        let msg = recv_json(ws)
            .await
            .unwrap_or_else(|| panic!("no {event_type} event received"));
        if msg["type"] == event_type {
            return msg;
        }
    }
}

/// Skips `conversations` pushes until one satisfies `predicate`.
pub async fn recv_conversations_where(
    ws: &mut WsClient,
    predicate: impl Fn(&Value) -> bool,
) -> Value {
    loop {
        let msg = recv_type(ws, "conversations").await;
        if predicate(&msg) {
            return msg;
        }
    }
}

pub async fn send_json(ws: &mut WsClient, value: &Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}
