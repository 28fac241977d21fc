//! Inbox coordinator
//!
//! Ties the conversation list and the active thread together: selecting a
//! conversation switches the thread, and a successful send or a newly
//! started conversation refreshes the list right away.

use std::sync::Arc;

use super::conversations::ConversationSync;
use super::messages::MessageSync;
use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::{Conversation, Message};

pub struct Inbox {
    client: Arc<ApiClient>,
    conversations: ConversationSync,
    messages: MessageSync,
}

impl Inbox {
    pub fn new(client: Arc<ApiClient>, config: &ClientConfig) -> Self {
        Self {
            conversations: ConversationSync::new(client.clone(), config.conversation_poll_interval),
            messages: MessageSync::new(
                client.clone(),
                config.message_poll_interval,
                config.messages_per_page,
            ),
            client,
        }
    }

    /// Start keeping the conversation list fresh
    pub fn activate(&self) {
        self.conversations.activate();
    }

    /// Stop all polling
    pub fn deactivate(&self) {
        self.messages.deactivate();
        self.conversations.deactivate();
    }

    /// Select a conversation and show its thread.
    ///
    /// Re-selecting the conversation already shown keeps its thread running.
    pub fn select(&self, conversation: Conversation) {
        let id = conversation.id;
        self.conversations.select(conversation);
        if self.messages.conversation_id() != Some(id) || !self.messages.is_active() {
            self.messages.activate(id);
        }
    }

    /// Send the active draft, then refresh the conversation list
    pub async fn send(&self) -> Result<Message, ApiError> {
        let message = self.messages.send().await?;
        self.conversations.refresh_now();
        Ok(message)
    }

    /// Handle a conversation created by the start-conversation flow
    pub fn conversation_started(&self, conversation: Conversation) {
        self.conversations.refresh_now();
        self.select(conversation);
    }

    /// Whether the current user may start new conversations
    pub fn can_start_conversations(&self) -> bool {
        self.client
            .session()
            .current()
            .is_some_and(|user| user.is_employer())
    }

    pub fn conversations(&self) -> &ConversationSync {
        &self.conversations
    }

    pub fn messages(&self) -> &MessageSync {
        &self.messages
    }
}
