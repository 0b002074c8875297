use crate::models::conversation::ConversationThread;
use crate::models::session::Session;
use crate::services::aggregator::{ConversationAggregator, RoleInference};
use crate::store::MessageStore;
use crate::utils::error::{AppError, AppResult};
use crate::utils::permissions::require_admin;

/// Every conversation in the store, soft-deleted ones included.
pub async fn list_all_conversations(
    store: &dyn MessageStore,
    session: &Session,
    inference: &dyn RoleInference,
) -> AppResult<Vec<ConversationThread>> {
    require_admin(session)?;

    let messages = store.all_messages().await?;
    Ok(ConversationAggregator::new(&session.user_id, inference)
        .include_deleted(true)
        .aggregate(&messages))
}

/// Flags every message of the conversation as deleted. Nothing is removed.
pub async fn soft_delete_conversation(
    store: &dyn MessageStore,
    session: &Session,
    conversation_id: &str,
) -> AppResult<u64> {
    require_admin(session)?;

    if store
        .messages_in_conversation(conversation_id)
        .await?
        .is_empty()
    {
        return Err(AppError::NotFound("Conversation not found".to_string()));
    }

    let flagged = store.soft_delete_conversation(conversation_id).await?;
    tracing::info!(
        "Admin {} soft-deleted {} messages in {}",
        session.user_id,
        flagged,
        conversation_id
    );
    Ok(flagged)
}
