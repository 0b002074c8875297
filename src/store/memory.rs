use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use super::{ChangeFeed, ChangeNotice, MessageStore, ServerClock};
use crate::models::direct_message::DirectMessage;
use crate::models::user::User;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::validate_user_id;

#[derive(Default)]
struct MemoryState {
    messages: Vec<DirectMessage>,
    users: HashMap<String, User>,
}

/// Process-local store with the same semantics as the SQLite backend.
///
/// Reads and writes can be made to fail on demand, which is how the error
/// paths of the services are exercised in tests.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    feed: ChangeFeed,
    clock: ServerClock,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Inserts a record as-is, keeping its id and timestamp. Used to load
    /// fixtures and history.
    pub async fn insert_raw(&self, message: DirectMessage) {
        let affected = message.participant_ids.clone();
        self.state.write().await.messages.push(message);
        self.feed.publish(affected);
    }

    fn check_read(&self) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("store unavailable".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("store rejected the write".to_string()));
        }
        Ok(())
    }
}

/// Pending timestamps order as `now`, the same as the aggregator.
fn newest_first(mut messages: Vec<DirectMessage>) -> Vec<DirectMessage> {
    let now = Utc::now();
    messages.sort_by_key(|m| Reverse(m.effective_time(now)));
    messages
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn messages_for_participant(&self, user_id: &str) -> AppResult<Vec<DirectMessage>> {
        self.check_read()?;
        let state = self.state.read().await;
        let matching = state
            .messages
            .iter()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn messages_in_conversation(
        &self,
        conversation_id: &str,
    ) -> AppResult<Vec<DirectMessage>> {
        self.check_read()?;
        let state = self.state.read().await;
        let mut matching: Vec<DirectMessage> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        let now = Utc::now();
        matching.sort_by_key(|m| m.effective_time(now));
        Ok(matching)
    }

    async fn all_messages(&self) -> AppResult<Vec<DirectMessage>> {
        self.check_read()?;
        let state = self.state.read().await;
        Ok(newest_first(state.messages.clone()))
    }

    async fn append_message(&self, mut message: DirectMessage) -> AppResult<DirectMessage> {
        self.check_write()?;
        message.id = Uuid::new_v4().to_string();
        message.timestamp = Some(self.clock.now());

        self.state.write().await.messages.push(message.clone());
        self.feed.publish(message.participant_ids.clone());
        Ok(message)
    }

    async fn mark_read(&self, message_ids: &[String]) -> AppResult<u64> {
        self.check_write()?;
        let mut affected = Vec::new();
        let mut changed = 0;
        {
            let mut state = self.state.write().await;
            for message in state.messages.iter_mut() {
                if !message.is_read_by_receiver && message_ids.contains(&message.id) {
                    message.is_read_by_receiver = true;
                    affected.extend(message.participant_ids.iter().cloned());
                    changed += 1;
                }
            }
        }
        self.feed.publish(affected);
        Ok(changed)
    }

    async fn soft_delete_conversation(&self, conversation_id: &str) -> AppResult<u64> {
        self.check_write()?;
        let mut affected = Vec::new();
        let mut changed = 0;
        {
            let mut state = self.state.write().await;
            for message in state.messages.iter_mut() {
                if message.conversation_id == conversation_id && !message.is_deleted_by_admin {
                    message.is_deleted_by_admin = true;
                    affected.extend(message.participant_ids.iter().cloned());
                    changed += 1;
                }
            }
        }
        self.feed.publish(affected);
        Ok(changed)
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        self.check_read()?;
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> AppResult<()> {
        self.check_write()?;
        validate_user_id(&user.id)?;
        self.state
            .write()
            .await
            .users
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn set_blocked_users(&self, user_id: &str, blocked_users: &[String]) -> AppResult<()> {
        self.check_write()?;
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.blocked_users = blocked_users.to_vec();
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeNotice> {
        self.feed.subscribe()
    }
}
