//! The document-store contract the messaging services are written against.
//!
//! Two backends implement it: [`sqlite::SqliteStore`] for the server and
//! [`memory::InMemoryStore`] for tests and embedding. Both publish a
//! [`ChangeNotice`] for every write so [`subscription::subscribe`] can turn
//! writes into full snapshots.

pub mod memory;
pub mod sqlite;
pub mod subscription;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::models::direct_message::DirectMessage;
use crate::models::user::User;
use crate::utils::error::AppResult;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use subscription::{Subscription, subscribe};

pub const DEFAULT_CHANGE_FEED_CAPACITY: usize = 1000;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Participant containment query, newest first.
    async fn messages_for_participant(&self, user_id: &str) -> AppResult<Vec<DirectMessage>>;

    /// Every message of one conversation, oldest first.
    async fn messages_in_conversation(&self, conversation_id: &str)
    -> AppResult<Vec<DirectMessage>>;

    /// The whole message log, newest first. Admin tooling only.
    async fn all_messages(&self) -> AppResult<Vec<DirectMessage>>;

    /// Appends `message`, assigning its id and server timestamp.
    async fn append_message(&self, message: DirectMessage) -> AppResult<DirectMessage>;

    /// Marks the given messages read in one batch. Returns how many changed.
    async fn mark_read(&self, message_ids: &[String]) -> AppResult<u64>;

    /// Sets `is_deleted_by_admin` on every message of the conversation.
    async fn soft_delete_conversation(&self, conversation_id: &str) -> AppResult<u64>;

    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>>;

    async fn upsert_user(&self, user: &User) -> AppResult<()>;

    async fn set_blocked_users(&self, user_id: &str, blocked_users: &[String]) -> AppResult<()>;

    fn changes(&self) -> broadcast::Receiver<ChangeNotice>;
}

/// Published after every write; lists the users whose message view changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotice {
    pub affected_users: Vec<String>,
}

impl ChangeNotice {
    pub fn touches(&self, user_id: &str) -> bool {
        self.affected_users.iter().any(|id| id == user_id)
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeNotice>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish<I, S>(&self, users: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut affected_users: Vec<String> = users.into_iter().map(Into::into).collect();
        affected_users.sort();
        affected_users.dedup();
        if affected_users.is_empty() {
            return;
        }
        // No receivers just means nobody is subscribed right now.
        let _ = self.tx.send(ChangeNotice { affected_users });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_FEED_CAPACITY)
    }
}

/// Hands out strictly increasing server timestamps so the message order is
/// total even when two writes land in the same microsecond. Stored times
/// carry microsecond precision, so the clock does too.
#[derive(Debug, Default)]
pub struct ServerClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl ServerClock {
    pub fn now(&self) -> DateTime<Utc> {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(prev) = *last
            && now <= prev
        {
            now = prev + Duration::microseconds(1);
        }
        *last = Some(now);
        now
    }
}
