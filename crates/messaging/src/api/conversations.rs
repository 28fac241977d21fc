//! Messaging endpoints

use serde_json::json;

use super::multipart::Multipart;
use super::normalize::{normalize_message, normalize_messages};
use super::transport::ApiRequest;
use super::wire::{ConversationsResponse, MessagesResponse, SendMessageResponse, StartConversationResponse};
use super::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::models::{Conversation, ConversationId, Message, UserId};

/// A file to upload with a message
#[derive(Debug, Clone)]
pub struct OutboundFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl ApiClient {
    /// List the current user's conversations, in server order
    pub fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let response: ConversationsResponse =
            self.send_json(ApiRequest::get("/messages/conversations"))?;
        Ok(response.conversations)
    }

    /// List one page of messages in a conversation, oldest first
    pub fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Message>, ApiError> {
        self.message_page(conversation_id, page, per_page).map(|(messages, _)| messages)
    }

    /// The newest `window` messages of a conversation, oldest first
    ///
    /// The server pages oldest-first, so threads longer than one page need
    /// the last page, plus the one before it when the last page is short.
    pub fn latest_messages(
        &self,
        conversation_id: ConversationId,
        window: u32,
    ) -> Result<Vec<Message>, ApiError> {
        let window = window.max(1);
        let (first, total) = self.message_page(conversation_id, 1, window)?;
        if total <= u64::from(window) {
            return Ok(first);
        }

        let last_page = u32::try_from(total.div_ceil(u64::from(window))).unwrap_or(u32::MAX);
        let (last, _) = self.message_page(conversation_id, last_page, window)?;
        let mut tail = if last.len() < window as usize {
            let mut previous = if last_page == 2 {
                first
            } else {
                self.message_page(conversation_id, last_page - 1, window)?.0
            };
            previous.extend(last);
            previous
        } else {
            last
        };

        let skip = tail.len().saturating_sub(window as usize);
        Ok(tail.split_off(skip))
    }

    /// One page of messages and the server's total message count
    fn message_page(
        &self,
        conversation_id: ConversationId,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Message>, u64), ApiError> {
        let request = ApiRequest::get(format!("/messages/conversations/{}/messages", conversation_id))
            .query("page", page)
            .query("per_page", per_page);
        let response: MessagesResponse = self.send_json(request)?;
        let total = response.total.unwrap_or(response.messages.len() as u64);
        Ok((normalize_messages(response.messages), total))
    }

    /// Send a message with text, a file, or both
    ///
    /// Returns the server-confirmed message.
    pub fn send_message(
        &self,
        conversation_id: ConversationId,
        content: Option<&str>,
        file: Option<OutboundFile>,
    ) -> Result<Message, ApiError> {
        let content = content.filter(|c| !c.trim().is_empty());
        if content.is_none() && file.is_none() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let mut form = Multipart::new();
        if let Some(content) = content {
            form = form.text("content", content);
        }
        if let Some(file) = file {
            form = form.file("file", file.file_name, file.data);
        }

        let request =
            ApiRequest::post(format!("/messages/conversations/{}/send", conversation_id)).multipart(form);
        let response: SendMessageResponse = self.send_json(request)?;
        normalize_message(response.data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Download an attachment by its stored file name
    pub fn download_file(&self, stored_name: &str) -> Result<Vec<u8>, ApiError> {
        let path = format!("/messages/files/{}", urlencoding::encode(stored_name));
        Ok(self.send(ApiRequest::get(path))?.body)
    }

    /// Reset the unread count of a conversation for the current user
    pub fn mark_read(&self, conversation_id: ConversationId) -> Result<(), ApiError> {
        self.send(ApiRequest::post(format!(
            "/messages/conversations/{}/mark-read",
            conversation_id
        )))?;
        Ok(())
    }

    /// Start (or reopen) a conversation with another user
    pub fn start_conversation(&self, recipient_id: UserId) -> Result<Conversation, ApiError> {
        let request = ApiRequest::post("/messages/conversations/start")
            .json(json!({ "recipient_id": recipient_id }));
        let response: StartConversationResponse = self.send_json(request)?;
        Ok(response.conversation)
    }
}
