use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::UserRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub display_name: String,
    pub avatar_seed: Option<String>,
    /// `None` while no message in the thread has revealed a specific role.
    pub role: Option<UserRole>,
}

/// Summary of every message exchanged between two users. Derived from the
/// message log on each snapshot and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    pub id: String,
    pub participants: [Participant; 2],
    pub last_subject: String,
    pub last_snippet: String,
    pub last_sender_id: String,
    pub last_timestamp: DateTime<Utc>,
    pub message_count: usize,
    pub unread_count: usize,
    pub has_deleted_messages: bool,
}

impl ConversationThread {
    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    /// The other side of the thread from `viewer_id`'s point of view. For a
    /// viewer outside the thread this is the second participant.
    pub fn counterparty(&self, viewer_id: &str) -> &Participant {
        if self.participants[0].user_id == viewer_id {
            &self.participants[1]
        } else if self.participants[1].user_id == viewer_id {
            &self.participants[0]
        } else {
            &self.participants[1]
        }
    }
}
