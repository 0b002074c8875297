use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::store::MessageStore;
use crate::utils::error::AppResult;

/// Marks every unread message addressed to `viewer_id` in the conversation
/// as read, in one batch. Nothing unread means no write at all.
pub async fn reconcile_read(
    store: &dyn MessageStore,
    conversation_id: &str,
    viewer_id: &str,
) -> AppResult<u64> {
    let unread: Vec<String> = store
        .messages_in_conversation(conversation_id)
        .await?
        .into_iter()
        .filter(|m| m.is_unread_for(viewer_id))
        .map(|m| m.id)
        .collect();

    if unread.is_empty() {
        return Ok(0);
    }

    let marked = store.mark_read(&unread).await?;
    tracing::debug!(
        "Marked {} messages read in {} for {}",
        marked,
        conversation_id,
        viewer_id
    );
    Ok(marked)
}

/// Background variant used when a thread is opened. Failures are logged and
/// otherwise dropped.
pub fn spawn_reconcile_read(
    store: Arc<dyn MessageStore>,
    conversation_id: String,
    viewer_id: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = reconcile_read(store.as_ref(), &conversation_id, &viewer_id).await {
            tracing::warn!(
                "Read-state update failed for {} in {}: {}",
                viewer_id,
                conversation_id,
                e
            );
        }
    })
}
