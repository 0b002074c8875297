use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::models::session::Session;
use crate::services::block_gate::{BlockState, block_user, check_block_state, unblock_user};
use crate::utils::error::AppResult;

#[derive(Serialize)]
struct BlockStateResponse {
    state: BlockState,
    can_compose: bool,
    notice: Option<String>,
}

impl From<BlockState> for BlockStateResponse {
    fn from(state: BlockState) -> Self {
        Self {
            state,
            can_compose: state.can_compose(),
            notice: (!state.can_compose()).then(|| state.to_string()),
        }
    }
}

#[derive(Serialize)]
struct BlockListResponse {
    blocked_users: Vec<String>,
}

async fn get_block_state(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
) -> AppResult<Json<BlockStateResponse>> {
    let block_state = check_block_state(state.store.as_ref(), &session.user_id, &user_id).await?;
    Ok(Json(block_state.into()))
}

async fn block_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
) -> AppResult<Json<BlockListResponse>> {
    let blocked_users = block_user(state.store.as_ref(), &session, &user_id).await?;
    Ok(Json(BlockListResponse { blocked_users }))
}

async fn unblock_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
) -> AppResult<Json<BlockListResponse>> {
    let blocked_users = unblock_user(state.store.as_ref(), &session, &user_id).await?;
    Ok(Json(BlockListResponse { blocked_users }))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/:user_id/block-state", get(get_block_state))
        .route(
            "/:user_id/block",
            post(block_user_handler).delete(unblock_user_handler),
        )
        .with_state(state)
}
