use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_util::sync::CancellationToken;

use super::MessageStore;
use crate::models::direct_message::DirectMessage;
use crate::utils::error::AppResult;

pub type Snapshot = AppResult<Vec<DirectMessage>>;

const SNAPSHOT_BUFFER: usize = 16;

/// Live view of "messages where I participate".
///
/// Yields one full snapshot on open and another after every write that
/// touches the user. A failed query is delivered once and ends the
/// subscription. Dropping the handle cancels it.
pub struct Subscription {
    snapshots: mpsc::Receiver<Snapshot>,
    cancel: CancellationToken,
}

impl Subscription {
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.snapshots.recv().await
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && !self.snapshots.is_closed()
    }

    pub fn unsubscribe(self) {
        self.cancel.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn subscribe(store: Arc<dyn MessageStore>, user_id: impl Into<String>) -> Subscription {
    let user_id = user_id.into();
    let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    // Taken before the first query so a write racing the initial snapshot
    // still triggers a refresh.
    let mut changes = store.changes();

    tokio::spawn(async move {
        tracing::debug!("Subscription opened for {}", user_id);

        if !push_snapshot(store.as_ref(), &user_id, &tx).await {
            return;
        }

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                notice = changes.recv() => match notice {
                    Ok(notice) if notice.touches(&user_id) => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Subscription for {} lagged by {} notices", user_id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }

            if !push_snapshot(store.as_ref(), &user_id, &tx).await {
                break;
            }
        }

        tracing::debug!("Subscription closed for {}", user_id);
    });

    Subscription {
        snapshots: rx,
        cancel,
    }
}

async fn push_snapshot(
    store: &dyn MessageStore,
    user_id: &str,
    tx: &mpsc::Sender<Snapshot>,
) -> bool {
    match store.messages_for_participant(user_id).await {
        Ok(messages) => tx.send(Ok(messages)).await.is_ok(),
        Err(e) => {
            tracing::error!("Snapshot query failed for {}: {}", user_id, e);
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}
