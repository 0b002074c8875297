use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::models::user::UserRole;
use crate::utils::error::{AppError, AppResult};

pub const CONVERSATION_ID_SEPARATOR: &str = "_";

/// Both participants compute the same id no matter who sends first.
pub fn conversation_id(user_a: &str, user_b: &str) -> String {
    let [first, second] = participant_ids(user_a, user_b);
    format!("{first}{CONVERSATION_ID_SEPARATOR}{second}")
}

pub fn participant_ids(user_a: &str, user_b: &str) -> [String; 2] {
    if user_a <= user_b {
        [user_a.to_string(), user_b.to_string()]
    } else {
        [user_b.to_string(), user_a.to_string()]
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Invalid timestamp {raw:?}: {e}")))
}

/// Role pairing of a message, `<sender>_to_<receiver>` on the wire.
///
/// `General` is the tag older records carry when the counterparty's role was
/// not known at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MessageType {
    Pairing { sender: UserRole, receiver: UserRole },
    General,
}

impl MessageType {
    pub fn between(sender: UserRole, receiver: UserRole) -> Self {
        MessageType::Pairing { sender, receiver }
    }

    pub fn sender_role(&self) -> Option<UserRole> {
        match self {
            MessageType::Pairing { sender, .. } => Some(*sender),
            MessageType::General => None,
        }
    }

    pub fn receiver_role(&self) -> Option<UserRole> {
        match self {
            MessageType::Pairing { receiver, .. } => Some(*receiver),
            MessageType::General => None,
        }
    }

    pub fn is_peer_to_peer(&self) -> bool {
        matches!(self, MessageType::Pairing { sender, receiver } if sender == receiver)
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s == "general" {
            return Some(MessageType::General);
        }
        let (sender, receiver) = s.split_once("_to_")?;
        Some(MessageType::Pairing {
            sender: UserRole::parse(sender)?,
            receiver: UserRole::parse(receiver)?,
        })
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Pairing { sender, receiver } => write!(f, "{sender}_to_{receiver}"),
            MessageType::General => f.write_str("general"),
        }
    }
}

impl TryFrom<String> for MessageType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MessageType::parse(&value).ok_or_else(|| format!("unknown message type: {value}"))
    }
}

impl From<MessageType> for String {
    fn from(value: MessageType) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: String,
    /// `None` until the store assigns the server time.
    pub timestamp: Option<DateTime<Utc>>,
    pub sender_id: String,
    pub receiver_id: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub sender_avatar_seed: Option<String>,
    pub receiver_avatar_seed: Option<String>,
    pub subject: String,
    pub body: String,
    pub message_type: MessageType,
    pub conversation_id: String,
    pub participant_ids: [String; 2],
    pub is_read_by_receiver: bool,
    pub is_deleted_by_admin: bool,
}

impl DirectMessage {
    /// Pending timestamps sort as `now` so optimistic sends land last.
    pub fn effective_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp.unwrap_or(now)
    }

    pub fn is_unread_for(&self, user_id: &str) -> bool {
        self.receiver_id == user_id && !self.is_read_by_receiver
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.participant_ids.iter().any(|id| id == user_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DirectMessageRow {
    pub id: String,
    pub conversation_id: String,
    pub participant_a: String,
    pub participant_b: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub sender_avatar_seed: Option<String>,
    pub receiver_avatar_seed: Option<String>,
    pub subject: String,
    pub body: String,
    pub message_type: String,
    pub sent_at: String,
    pub is_read_by_receiver: i64,
    pub is_deleted_by_admin: i64,
}

impl TryFrom<DirectMessageRow> for DirectMessage {
    type Error = AppError;

    fn try_from(row: DirectMessageRow) -> AppResult<Self> {
        let message_type = MessageType::parse(&row.message_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown message type: {}", row.message_type))
        })?;

        Ok(Self {
            id: row.id,
            timestamp: Some(parse_timestamp(&row.sent_at)?),
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            sender_name: row.sender_name,
            receiver_name: row.receiver_name,
            sender_avatar_seed: row.sender_avatar_seed,
            receiver_avatar_seed: row.receiver_avatar_seed,
            subject: row.subject,
            body: row.body,
            message_type,
            conversation_id: row.conversation_id,
            participant_ids: [row.participant_a, row.participant_b],
            is_read_by_receiver: row.is_read_by_receiver != 0,
            is_deleted_by_admin: row.is_deleted_by_admin != 0,
        })
    }
}
