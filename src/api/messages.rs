use axum::{
    Extension, Json, Router,
    extract::State,
    routing::post,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::models::direct_message::DirectMessage;
use crate::models::session::Session;
use crate::services::composer::{Draft, compose_message};
use crate::utils::error::AppResult;

#[derive(Deserialize)]
struct SendMessageRequest {
    recipient_id: String,
    #[serde(flatten)]
    draft: Draft,
}

async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<DirectMessage>> {
    let message =
        compose_message(state.store.as_ref(), &session, &req.recipient_id, &req.draft).await?;
    Ok(Json(message))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(send_message_handler))
        .with_state(state)
}
