use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{ChangeFeed, ChangeNotice, MessageStore, ServerClock};
use crate::database::DbPool;
use crate::models::direct_message::{DirectMessage, DirectMessageRow, format_timestamp};
use crate::models::user::{User, UserRow};
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::validate_user_id;

pub struct SqliteStore {
    pool: DbPool,
    feed: ChangeFeed,
    clock: ServerClock,
}

impl SqliteStore {
    pub fn new(pool: DbPool, change_feed_capacity: usize) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(change_feed_capacity),
            clock: ServerClock::default(),
        }
    }
}

fn into_messages(rows: Vec<DirectMessageRow>) -> AppResult<Vec<DirectMessage>> {
    rows.into_iter().map(DirectMessage::try_from).collect()
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn messages_for_participant(&self, user_id: &str) -> AppResult<Vec<DirectMessage>> {
        let rows = sqlx::query_as::<_, DirectMessageRow>(
            "SELECT * FROM direct_messages
             WHERE participant_a = ? OR participant_b = ?
             ORDER BY sent_at DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        into_messages(rows)
    }

    async fn messages_in_conversation(
        &self,
        conversation_id: &str,
    ) -> AppResult<Vec<DirectMessage>> {
        let rows = sqlx::query_as::<_, DirectMessageRow>(
            "SELECT * FROM direct_messages WHERE conversation_id = ? ORDER BY sent_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        into_messages(rows)
    }

    async fn all_messages(&self) -> AppResult<Vec<DirectMessage>> {
        let rows = sqlx::query_as::<_, DirectMessageRow>(
            "SELECT * FROM direct_messages ORDER BY sent_at DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        into_messages(rows)
    }

    async fn append_message(&self, mut message: DirectMessage) -> AppResult<DirectMessage> {
        let sent_at = self.clock.now();
        message.id = Uuid::new_v4().to_string();
        message.timestamp = Some(sent_at);

        let [participant_a, participant_b] = &message.participant_ids;

        sqlx::query(
            "INSERT INTO direct_messages (id, conversation_id, participant_a, participant_b,
                sender_id, receiver_id, sender_name, receiver_name, sender_avatar_seed,
                receiver_avatar_seed, subject, body, message_type, sent_at,
                is_read_by_receiver, is_deleted_by_admin)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(participant_a)
        .bind(participant_b)
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(&message.sender_name)
        .bind(&message.receiver_name)
        .bind(&message.sender_avatar_seed)
        .bind(&message.receiver_avatar_seed)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.message_type.to_string())
        .bind(format_timestamp(sent_at))
        .bind(message.is_read_by_receiver as i64)
        .bind(message.is_deleted_by_admin as i64)
        .execute(self.pool.as_ref())
        .await?;

        self.feed.publish(message.participant_ids.clone());
        Ok(message)
    }

    async fn mark_read(&self, message_ids: &[String]) -> AppResult<u64> {
        if message_ids.is_empty() {
            return Ok(0);
        }

        let mut affected = Vec::new();
        let mut tx = self.pool.begin().await?;
        for id in message_ids {
            let updated = sqlx::query_as::<_, (String, String)>(
                "UPDATE direct_messages SET is_read_by_receiver = 1
                 WHERE id = ? AND is_read_by_receiver = 0
                 RETURNING participant_a, participant_b",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some((a, b)) = updated {
                affected.push(a);
                affected.push(b);
            }
        }
        tx.commit().await?;

        let changed = (affected.len() / 2) as u64;
        self.feed.publish(affected);
        Ok(changed)
    }

    async fn soft_delete_conversation(&self, conversation_id: &str) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let flagged = sqlx::query_as::<_, (String, String)>(
            "UPDATE direct_messages SET is_deleted_by_admin = 1
             WHERE conversation_id = ? AND is_deleted_by_admin = 0
             RETURNING participant_a, participant_b",
        )
        .bind(conversation_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let changed = flagged.len() as u64;
        self.feed.publish(flagged.into_iter().flat_map(|(a, b)| [a, b]));
        Ok(changed)
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn upsert_user(&self, user: &User) -> AppResult<()> {
        validate_user_id(&user.id)?;

        sqlx::query(
            "INSERT INTO users (id, display_name, role, avatar_seed, blocked_users, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                role = excluded.role,
                avatar_seed = excluded.avatar_seed,
                blocked_users = excluded.blocked_users",
        )
        .bind(&user.id)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(&user.avatar_seed)
        .bind(serde_json::to_string(&user.blocked_users)?)
        .bind(&user.created_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn set_blocked_users(&self, user_id: &str, blocked_users: &[String]) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET blocked_users = ? WHERE id = ?")
            .bind(serde_json::to_string(blocked_users)?)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeNotice> {
        self.feed.subscribe()
    }
}
