use serde::{Deserialize, Serialize};

use crate::models::direct_message::{
    DirectMessage, MessageType, conversation_id, participant_ids,
};
use crate::models::session::Session;
use crate::models::user::UserRole;
use crate::services::block_gate::{BlockState, evaluate};
use crate::store::MessageStore;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::{validate_message_body, validate_subject, validate_user_id};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub subject: String,
    pub body: String,
}

impl Draft {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// The tag always reflects the roles resolved at send time, admin senders
/// included.
pub fn infer_message_type(sender: UserRole, receiver: UserRole) -> MessageType {
    MessageType::between(sender, receiver)
}

/// Sends `draft` from the session user to `recipient_id`.
///
/// The draft is only borrowed; on any error the caller still holds it and
/// can retry by hand.
pub async fn compose_message(
    store: &dyn MessageStore,
    session: &Session,
    recipient_id: &str,
    draft: &Draft,
) -> AppResult<DirectMessage> {
    validate_user_id(recipient_id)?;
    validate_subject(&draft.subject)?;
    validate_message_body(&draft.body)?;

    if recipient_id == session.user_id {
        return Err(AppError::BadRequest(
            "Cannot send a message to yourself".to_string(),
        ));
    }

    let recipient = store
        .get_user(recipient_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;
    let sender = store
        .get_user(&session.user_id)
        .await?
        .ok_or_else(|| AppError::Auth("User no longer exists".to_string()))?;

    let block_state = evaluate(&sender, &recipient);
    if block_state != BlockState::Open {
        return Err(AppError::Blocked(block_state));
    }

    let message = DirectMessage {
        id: String::new(),
        timestamp: None,
        sender_id: session.user_id.clone(),
        receiver_id: recipient.id.clone(),
        sender_name: session.display_name.clone(),
        receiver_name: recipient.display_name.clone(),
        sender_avatar_seed: session.avatar_seed.clone(),
        receiver_avatar_seed: recipient.avatar_seed.clone(),
        subject: draft.subject.trim().to_string(),
        body: draft.body.clone(),
        message_type: infer_message_type(session.role, recipient.role),
        conversation_id: conversation_id(&session.user_id, &recipient.id),
        participant_ids: participant_ids(&session.user_id, &recipient.id),
        is_read_by_receiver: false,
        is_deleted_by_admin: false,
    };

    let stored = store.append_message(message).await.map_err(|e| {
        tracing::error!(
            "Failed to send message from {} to {}: {}",
            session.user_id,
            recipient.id,
            e
        );
        AppError::SendFailed(e.to_string())
    })?;

    tracing::debug!(
        "Message {} appended to conversation {}",
        stored.id,
        stored.conversation_id
    );
    Ok(stored)
}
