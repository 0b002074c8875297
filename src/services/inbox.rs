use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::models::conversation::ConversationThread;
use crate::models::session::Session;
use crate::services::aggregator::{ConversationAggregator, RoleInference};
use crate::store::{MessageStore, subscribe};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxState {
    pub threads: Vec<ConversationThread>,
    /// Set once the first snapshot has been folded.
    pub loaded: bool,
    /// Set when the subscription failed; the inbox stays frozen afterwards.
    pub error: Option<String>,
}

impl InboxState {
    pub fn total_unread(&self) -> usize {
        self.threads.iter().map(|t| t.unread_count).sum()
    }
}

/// Live, aggregated thread list for one session.
///
/// Every snapshot from the store is folded from scratch and published.
/// Closing or dropping the inbox ends its subscription.
pub struct Inbox {
    state: watch::Receiver<InboxState>,
    cancel: CancellationToken,
}

impl Inbox {
    pub fn open(
        store: Arc<dyn MessageStore>,
        session: Session,
        inference: Arc<dyn RoleInference>,
    ) -> Self {
        let (tx, rx) = watch::channel(InboxState::default());
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut subscription = subscribe(store, session.user_id.clone());
            let aggregator = ConversationAggregator::for_session(&session, inference.as_ref());

            loop {
                let snapshot = tokio::select! {
                    _ = token.cancelled() => break,
                    snapshot = subscription.next() => snapshot,
                };

                match snapshot {
                    Some(Ok(messages)) => {
                        let threads = aggregator.aggregate(&messages);
                        tx.send_replace(InboxState {
                            threads,
                            loaded: true,
                            error: None,
                        });
                    }
                    Some(Err(e)) => {
                        tracing::error!("Inbox for {} stopped: {}", session.user_id, e);
                        tx.send_modify(|state| {
                            state.error = Some("Could not load conversations".to_string());
                        });
                        break;
                    }
                    None => break,
                }
            }
        });

        Self { state: rx, cancel }
    }

    pub fn current(&self) -> InboxState {
        self.state.borrow().clone()
    }

    /// Waits for the next published state. `None` once the inbox has stopped
    /// and every state has been seen.
    pub async fn changed(&mut self) -> Option<InboxState> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    pub fn close(self) {
        self.cancel.cancel();
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
