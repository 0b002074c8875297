use crate::models::direct_message::DirectMessage;
use crate::models::session::Session;
use crate::utils::error::{AppError, AppResult};

pub fn require_admin(session: &Session) -> AppResult<()> {
    if !session.is_admin() {
        return Err(AppError::Forbidden(
            "Site admin privileges required".to_string(),
        ));
    }
    Ok(())
}

/// Narrows `messages` to the ones the session may read. Admins keep
/// everything; anyone else keeps only messages they are a party to, and is
/// refused if that leaves nothing.
pub fn require_participant(
    session: &Session,
    messages: Vec<DirectMessage>,
) -> AppResult<Vec<DirectMessage>> {
    if session.is_admin() {
        return Ok(messages);
    }

    let own: Vec<DirectMessage> = messages
        .into_iter()
        .filter(|m| m.involves(&session.user_id))
        .collect();

    if own.is_empty() {
        return Err(AppError::Forbidden(
            "You are not part of this conversation".to_string(),
        ));
    }
    Ok(own)
}
