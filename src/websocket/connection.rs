use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::events::{ClientMessage, ServerMessage};
use crate::api::AppState;
use crate::models::direct_message::conversation_id;
use crate::models::session::Session;
use crate::services::block_gate::check_block_state;
use crate::services::inbox::{Inbox, InboxState};
use crate::services::read_state::spawn_reconcile_read;

const OUTBOUND_BUFFER: usize = 64;

/// Pushes the session's thread list on every change and answers thread
/// selection. The inbox subscription lives exactly as long as the socket.
pub async fn handle_connection(socket: WebSocket, state: Arc<AppState>, session: Session) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Failed to encode websocket event: {}", e),
            }
        }
    });

    if out_tx
        .send(ServerMessage::Connected {
            user_id: session.user_id.clone(),
        })
        .await
        .is_err()
    {
        tracing::debug!("Websocket for {} closed before greeting", session.user_id);
        send_task.abort();
        return;
    }

    let mut inbox = Inbox::open(
        state.store.clone(),
        session.clone(),
        state.inference.clone(),
    );
    let inbox_tx = out_tx.clone();
    let inbox_task = tokio::spawn(async move {
        while let Some(snapshot) = inbox.changed().await {
            if inbox_tx.send(inbox_event(snapshot)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let recv_session = session.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let Message::Text(text) = msg else {
                continue;
            };

            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Heartbeat) => ServerMessage::Pong,
                Ok(ClientMessage::OpenThread {
                    conversation_id,
                    counterparty_id,
                }) => open_thread(&recv_state, &recv_session, conversation_id, counterparty_id).await,
                Err(e) => {
                    tracing::debug!("Unrecognized websocket message: {}", e);
                    ServerMessage::Error {
                        message: "Unrecognized message".to_string(),
                    }
                }
            };

            if out_tx.send(reply).await.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    inbox_task.abort();

    tracing::debug!("Websocket closed for {}", session.user_id);
}

fn inbox_event(snapshot: InboxState) -> ServerMessage {
    match snapshot.error {
        Some(message) => ServerMessage::SubscriptionFailed { message },
        None => ServerMessage::Conversations {
            total_unread: snapshot.total_unread(),
            threads: snapshot.threads,
        },
    }
}

async fn open_thread(
    state: &Arc<AppState>,
    session: &Session,
    requested_id: String,
    counterparty_id: String,
) -> ServerMessage {
    if requested_id != conversation_id(&session.user_id, &counterparty_id) {
        return ServerMessage::Error {
            message: "You are not part of this conversation".to_string(),
        };
    }

    spawn_reconcile_read(
        state.store.clone(),
        requested_id.clone(),
        session.user_id.clone(),
    );

    match check_block_state(state.store.as_ref(), &session.user_id, &counterparty_id).await {
        Ok(block_state) => ServerMessage::ThreadOpened {
            conversation_id: requested_id,
            block_state,
            notice: (!block_state.can_compose()).then(|| block_state.to_string()),
        },
        Err(e) => ServerMessage::Error {
            message: e.to_string(),
        },
    }
}
