use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::session::Session;
use crate::models::user::User;
use crate::store::MessageStore;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::validate_user_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    Open,
    /// The viewer's own list contains the counterparty.
    BlockedBySelf,
    BlockedByCounterparty,
}

impl BlockState {
    pub fn can_compose(&self) -> bool {
        *self == BlockState::Open
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BlockState::Open => "Messaging is open",
            BlockState::BlockedBySelf => "You have blocked this user",
            BlockState::BlockedByCounterparty => "You have been blocked by the recipient",
        };
        f.write_str(text)
    }
}

/// When both sides block each other the viewer sees their own block, since
/// that is the one they can lift.
pub fn evaluate(viewer: &User, counterparty: &User) -> BlockState {
    if viewer.has_blocked(&counterparty.id) {
        BlockState::BlockedBySelf
    } else if counterparty.has_blocked(&viewer.id) {
        BlockState::BlockedByCounterparty
    } else {
        BlockState::Open
    }
}

async fn load_user(store: &dyn MessageStore, user_id: &str, missing: &str) -> AppResult<User> {
    store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(missing.to_string()))
}

/// Point-in-time read of both block lists.
pub async fn check_block_state(
    store: &dyn MessageStore,
    viewer_id: &str,
    counterparty_id: &str,
) -> AppResult<BlockState> {
    let viewer = load_user(store, viewer_id, "User not found").await?;
    let counterparty = load_user(store, counterparty_id, "Recipient not found").await?;
    Ok(evaluate(&viewer, &counterparty))
}

pub async fn can_compose(
    store: &dyn MessageStore,
    viewer_id: &str,
    counterparty_id: &str,
) -> AppResult<bool> {
    Ok(check_block_state(store, viewer_id, counterparty_id)
        .await?
        .can_compose())
}

pub async fn block_user(
    store: &dyn MessageStore,
    session: &Session,
    target_id: &str,
) -> AppResult<Vec<String>> {
    validate_user_id(target_id)?;
    if target_id == session.user_id {
        return Err(AppError::Validation("Cannot block yourself".to_string()));
    }

    load_user(store, target_id, "User not found").await?;
    let viewer = load_user(store, &session.user_id, "User not found").await?;

    let mut blocked = viewer.blocked_users;
    if blocked.iter().any(|id| id == target_id) {
        return Ok(blocked);
    }
    blocked.push(target_id.to_string());

    store
        .set_blocked_users(&session.user_id, &blocked)
        .await
        .inspect_err(|e| tracing::error!("Failed to block {}: {}", target_id, e))?;

    tracing::info!("{} blocked {}", session.user_id, target_id);
    Ok(blocked)
}

pub async fn unblock_user(
    store: &dyn MessageStore,
    session: &Session,
    target_id: &str,
) -> AppResult<Vec<String>> {
    validate_user_id(target_id)?;
    let viewer = load_user(store, &session.user_id, "User not found").await?;

    let mut blocked = viewer.blocked_users;
    let before = blocked.len();
    blocked.retain(|id| id != target_id);
    if blocked.len() == before {
        return Ok(blocked);
    }

    store
        .set_blocked_users(&session.user_id, &blocked)
        .await
        .inspect_err(|e| tracing::error!("Failed to unblock {}: {}", target_id, e))?;

    tracing::info!("{} unblocked {}", session.user_id, target_id);
    Ok(blocked)
}
