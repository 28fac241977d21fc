//! Conversation model representing a two-party messaging thread

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Unique identifier for a conversation (server-assigned)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl ConversationId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The subset of the latest message shown in a conversation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePreview {
    #[serde(default)]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Summary of a conversation as seen by the current user
///
/// Conversations are never patched locally; the synchronizer replaces
/// the whole collection on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    /// The counterpart in the conversation (None if the account was removed)
    #[serde(default)]
    pub other_participant: Option<User>,
    #[serde(default)]
    pub last_message: Option<MessagePreview>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(id: impl Into<ConversationId>, other_participant: Option<User>) -> Self {
        Self {
            id: id.into(),
            other_participant,
            last_message: None,
            unread_count: 0,
            updated_at: None,
        }
    }

    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }
}
