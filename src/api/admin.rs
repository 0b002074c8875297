use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::models::conversation::ConversationThread;
use crate::models::direct_message::DirectMessage;
use crate::models::session::Session;
use crate::services::conversation::thread_messages;
use crate::services::moderation::{list_all_conversations, soft_delete_conversation};
use crate::utils::error::AppResult;
use crate::utils::permissions::require_admin;

#[derive(Serialize)]
struct ConversationListResponse {
    conversations: Vec<ConversationThread>,
    total: usize,
}

#[derive(Serialize)]
struct SoftDeleteResponse {
    success: bool,
    flagged: u64,
}

async fn list_all_conversations_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<ConversationListResponse>> {
    let conversations =
        list_all_conversations(state.store.as_ref(), &session, state.inference.as_ref()).await?;
    Ok(Json(ConversationListResponse {
        total: conversations.len(),
        conversations,
    }))
}

async fn get_conversation_messages(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(conversation_id): Path<String>,
) -> AppResult<Json<Vec<DirectMessage>>> {
    require_admin(&session)?;
    let messages = thread_messages(state.store.as_ref(), &session, &conversation_id).await?;
    Ok(Json(messages))
}

async fn soft_delete_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(conversation_id): Path<String>,
) -> AppResult<Json<SoftDeleteResponse>> {
    let flagged =
        soft_delete_conversation(state.store.as_ref(), &session, &conversation_id).await?;
    Ok(Json(SoftDeleteResponse {
        success: true,
        flagged,
    }))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/conversations", get(list_all_conversations_handler))
        .route(
            "/conversations/:conversation_id/messages",
            get(get_conversation_messages),
        )
        .route("/conversations/:conversation_id", delete(soft_delete_handler))
        .with_state(state)
}
