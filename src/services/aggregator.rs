//! Folds a flat list of direct messages into per-pair conversation threads.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::collections::HashMap;

use crate::models::conversation::{ConversationThread, Participant};
use crate::models::direct_message::DirectMessage;
use crate::models::session::Session;
use crate::models::user::UserRole;

pub const SNIPPET_CHARS: usize = 120;

/// Decides which role a message reveals for one of its participants.
pub trait RoleInference: Send + Sync {
    fn infer(&self, message: &DirectMessage, participant_id: &str) -> Option<UserRole>;
}

/// Reads roles off the message type tag. `general` reveals nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagRoleInference;

impl RoleInference for TagRoleInference {
    fn infer(&self, message: &DirectMessage, participant_id: &str) -> Option<UserRole> {
        if message.sender_id == participant_id {
            message.message_type.sender_role()
        } else if message.receiver_id == participant_id {
            message.message_type.receiver_role()
        } else {
            None
        }
    }
}

pub struct ConversationAggregator<'a> {
    viewer_id: &'a str,
    viewer_role: Option<UserRole>,
    inference: &'a dyn RoleInference,
    include_deleted: bool,
}

impl<'a> ConversationAggregator<'a> {
    pub fn new(viewer_id: &'a str, inference: &'a dyn RoleInference) -> Self {
        Self {
            viewer_id,
            viewer_role: None,
            inference,
            include_deleted: false,
        }
    }

    /// The viewer's own side always carries the session role.
    pub fn for_session(session: &'a Session, inference: &'a dyn RoleInference) -> Self {
        Self {
            viewer_role: Some(session.role),
            ..Self::new(&session.user_id, inference)
        }
    }

    /// Moderation view: soft-deleted messages stay in the fold.
    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    pub fn aggregate(&self, messages: &[DirectMessage]) -> Vec<ConversationThread> {
        self.aggregate_at(messages, Utc::now())
    }

    /// `now` stands in for timestamps the store has not resolved yet.
    pub fn aggregate_at(
        &self,
        messages: &[DirectMessage],
        now: DateTime<Utc>,
    ) -> Vec<ConversationThread> {
        // Keyed by the participant pair so two pairs can never share a thread.
        let mut threads: HashMap<&[String; 2], ConversationThread> = HashMap::new();

        let ordered = messages
            .iter()
            .filter(|m| self.include_deleted || !m.is_deleted_by_admin)
            .sorted_by_key(|m| m.effective_time(now));

        for message in ordered {
            let at = message.effective_time(now);
            let unread = usize::from(message.is_unread_for(self.viewer_id));

            match threads.get_mut(&message.participant_ids) {
                Some(thread) => {
                    for participant in thread.participants.iter_mut() {
                        if participant.role.is_none() {
                            participant.role = self.role_for(message, &participant.user_id);
                        }
                    }
                    thread.last_subject = message.subject.clone();
                    thread.last_snippet = snippet(&message.body);
                    thread.last_sender_id = message.sender_id.clone();
                    thread.last_timestamp = at;
                    thread.message_count += 1;
                    thread.unread_count += unread;
                    thread.has_deleted_messages |= message.is_deleted_by_admin;
                }
                None => {
                    let [first, second] = &message.participant_ids;
                    let thread = ConversationThread {
                        id: message.conversation_id.clone(),
                        participants: [
                            self.seed_participant(message, first),
                            self.seed_participant(message, second),
                        ],
                        last_subject: message.subject.clone(),
                        last_snippet: snippet(&message.body),
                        last_sender_id: message.sender_id.clone(),
                        last_timestamp: at,
                        message_count: 1,
                        unread_count: unread,
                        has_deleted_messages: message.is_deleted_by_admin,
                    };
                    threads.insert(&message.participant_ids, thread);
                }
            }
        }

        threads
            .into_values()
            .sorted_by(|a, b| {
                b.last_timestamp
                    .cmp(&a.last_timestamp)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .collect()
    }

    fn role_for(&self, message: &DirectMessage, participant_id: &str) -> Option<UserRole> {
        if participant_id == self.viewer_id
            && let Some(role) = self.viewer_role
        {
            return Some(role);
        }
        self.inference.infer(message, participant_id)
    }

    fn seed_participant(&self, message: &DirectMessage, participant_id: &str) -> Participant {
        let (display_name, avatar_seed) = if message.sender_id == participant_id {
            (&message.sender_name, &message.sender_avatar_seed)
        } else {
            (&message.receiver_name, &message.receiver_avatar_seed)
        };

        Participant {
            user_id: participant_id.to_string(),
            display_name: display_name.clone(),
            avatar_seed: avatar_seed.clone(),
            role: self.role_for(message, participant_id),
        }
    }
}

/// Threads for `viewer_id`, with roles read off the message tags.
pub fn aggregate(messages: &[DirectMessage], viewer_id: &str) -> Vec<ConversationThread> {
    ConversationAggregator::new(viewer_id, &TagRoleInference).aggregate(messages)
}

fn snippet(body: &str) -> String {
    let flat = body.split_whitespace().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(SNIPPET_CHARS).collect();
    cut.push('…');
    cut
}
