//! Message model representing a single entry in a conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, UserId};

/// Unique identifier for a message (server-assigned)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name, used when saving a download
    pub file_name: String,
    /// Size in bytes
    pub file_size: u64,
    /// Server-side stored name, used to fetch the file
    pub file_path: String,
    /// MIME type reported by the server
    pub file_type: Option<String>,
}

/// A message within a conversation
///
/// Invariant: a message carries content, an attachment, or both.
/// Records that violate this are rejected during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_system_message: bool,
    pub attachment: Option<Attachment>,
}

impl Message {
    /// Create a new message builder
    pub fn builder(
        id: impl Into<MessageId>,
        conversation_id: impl Into<ConversationId>,
        sender_id: impl Into<UserId>,
    ) -> MessageBuilder {
        MessageBuilder::new(id.into(), conversation_id.into(), sender_id.into())
    }

    /// Whether this message was sent by the given user
    pub fn is_from(&self, user_id: UserId) -> bool {
        self.sender_id == user_id
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: MessageId,
    conversation_id: ConversationId,
    sender_id: UserId,
    content: Option<String>,
    created_at: Option<DateTime<Utc>>,
    is_system_message: bool,
    attachment: Option<Attachment>,
}

impl MessageBuilder {
    fn new(id: MessageId, conversation_id: ConversationId, sender_id: UserId) -> Self {
        Self {
            id,
            conversation_id,
            sender_id,
            content: None,
            created_at: None,
            is_system_message: false,
            attachment: None,
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn system(mut self, is_system_message: bool) -> Self {
        self.is_system_message = is_system_message;
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn build(self) -> Message {
        Message {
            id: self.id,
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            content: self.content,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            is_system_message: self.is_system_message,
            attachment: self.attachment,
        }
    }
}
