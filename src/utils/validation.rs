use crate::models::direct_message::CONVERSATION_ID_SEPARATOR;
use crate::utils::error::{AppError, AppResult};

pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_BODY_LEN: usize = 4000;

pub fn validate_subject(subject: &str) -> AppResult<()> {
    if subject.chars().count() > MAX_SUBJECT_LEN {
        return Err(AppError::Validation(format!(
            "Subject must be at most {} characters long",
            MAX_SUBJECT_LEN
        )));
    }

    if subject.chars().any(|c| c.is_control()) {
        return Err(AppError::Validation(
            "Subject cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_message_body(body: &str) -> AppResult<()> {
    if body.trim().is_empty() {
        return Err(AppError::Validation(
            "Message content cannot be empty".to_string(),
        ));
    }

    if body.chars().count() > MAX_BODY_LEN {
        return Err(AppError::Validation(format!(
            "Message content must be at most {} characters long",
            MAX_BODY_LEN
        )));
    }

    Ok(())
}

pub fn validate_user_id(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::Validation("User id cannot be empty".to_string()));
    }

    if user_id.len() > 128 {
        return Err(AppError::Validation(
            "User id must be at most 128 characters long".to_string(),
        ));
    }

    // Conversation ids join two user ids with the separator.
    if user_id.contains(CONVERSATION_ID_SEPARATOR) {
        return Err(AppError::Validation(format!(
            "User id cannot contain {:?}",
            CONVERSATION_ID_SEPARATOR
        )));
    }

    Ok(())
}
