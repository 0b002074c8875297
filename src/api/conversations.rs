use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::models::conversation::ConversationThread;
use crate::models::direct_message::DirectMessage;
use crate::models::session::Session;
use crate::services::conversation::{list_conversations, thread_messages};
use crate::services::read_state::{reconcile_read, spawn_reconcile_read};
use crate::utils::error::AppResult;

#[derive(Serialize)]
struct ReadResponse {
    marked: u64,
}

async fn list_conversations_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<Vec<ConversationThread>>> {
    let threads =
        list_conversations(state.store.as_ref(), &session, state.inference.as_ref()).await?;
    Ok(Json(threads))
}

/// Opening a thread also clears its unread messages in the background.
async fn get_thread_messages(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(conversation_id): Path<String>,
) -> AppResult<Json<Vec<DirectMessage>>> {
    let messages = thread_messages(state.store.as_ref(), &session, &conversation_id).await?;

    if messages.iter().any(|m| m.is_unread_for(&session.user_id)) {
        spawn_reconcile_read(
            state.store.clone(),
            conversation_id,
            session.user_id.clone(),
        );
    }

    Ok(Json(messages))
}

async fn mark_thread_read(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(conversation_id): Path<String>,
) -> AppResult<Json<ReadResponse>> {
    thread_messages(state.store.as_ref(), &session, &conversation_id).await?;
    let marked = reconcile_read(state.store.as_ref(), &conversation_id, &session.user_id).await?;
    Ok(Json(ReadResponse { marked }))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_conversations_handler))
        .route("/:conversation_id/messages", get(get_thread_messages))
        .route("/:conversation_id/read", post(mark_thread_read))
        .with_state(state)
}
