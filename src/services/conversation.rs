use crate::models::conversation::ConversationThread;
use crate::models::direct_message::DirectMessage;
use crate::models::session::Session;
use crate::services::aggregator::{ConversationAggregator, RoleInference};
use crate::store::MessageStore;
use crate::utils::error::{AppError, AppResult};
use crate::utils::permissions::require_participant;

pub async fn list_conversations(
    store: &dyn MessageStore,
    session: &Session,
    inference: &dyn RoleInference,
) -> AppResult<Vec<ConversationThread>> {
    let messages = store.messages_for_participant(&session.user_id).await?;
    Ok(ConversationAggregator::for_session(session, inference).aggregate(&messages))
}

/// Messages of one thread, oldest first. Soft-deleted messages are only
/// returned to admins.
pub async fn thread_messages(
    store: &dyn MessageStore,
    session: &Session,
    conversation_id: &str,
) -> AppResult<Vec<DirectMessage>> {
    let messages = store.messages_in_conversation(conversation_id).await?;
    if messages.is_empty() {
        return Err(AppError::NotFound("Conversation not found".to_string()));
    }
    let readable = require_participant(session, messages)?;

    let visible: Vec<DirectMessage> = if session.is_admin() {
        readable
    } else {
        readable
            .into_iter()
            .filter(|m| !m.is_deleted_by_admin)
            .collect()
    };

    if visible.is_empty() {
        return Err(AppError::NotFound("Conversation not found".to_string()));
    }

    Ok(visible)
}
