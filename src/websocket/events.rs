use serde::{Deserialize, Serialize};

use crate::models::conversation::ConversationThread;
use crate::services::block_gate::BlockState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    OpenThread {
        conversation_id: String,
        counterparty_id: String,
    },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        user_id: String,
    },
    Conversations {
        threads: Vec<ConversationThread>,
        total_unread: usize,
    },
    SubscriptionFailed {
        message: String,
    },
    ThreadOpened {
        conversation_id: String,
        block_state: BlockState,
        notice: Option<String>,
    },
    Error {
        message: String,
    },
    Pong,
}
