//! Start-conversation flow for employers

use log::{info, warn};
use std::sync::Arc;

use crate::api::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::models::{Conversation, User, UserId};
use crate::sync::run_blocking;

/// Shown when a non-employer tries to start a conversation
pub const EMPLOYERS_ONLY: &str = "Only employers can start conversations";

/// An open start-conversation flow with its eligible recipients loaded
pub struct ConversationInitiator {
    client: Arc<ApiClient>,
    candidates: Vec<User>,
    closed: bool,
}

impl ConversationInitiator {
    /// Open the flow.
    ///
    /// Fails without any request when the current user is not an employer.
    pub async fn open(client: Arc<ApiClient>) -> Result<Self, ApiError> {
        let allowed = client.session().current().is_some_and(|u| u.is_employer());
        if !allowed {
            return Err(ApiError::Forbidden(EMPLOYERS_ONLY.to_string()));
        }

        let fetch = client.clone();
        let candidates = run_blocking(move || fetch.list_students())
            .await
            .inspect_err(|e| warn!("Failed to load students: {}", e))?;

        Ok(Self {
            client,
            candidates,
            closed: false,
        })
    }

    pub fn candidates(&self) -> &[User] {
        &self.candidates
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Start (or reopen) a conversation with one of the candidates.
    ///
    /// The flow closes on success and stays open on failure.
    pub async fn start(&mut self, recipient_id: UserId) -> Result<Conversation, ApiError> {
        if self.closed {
            return Err(ValidationError::MissingField("Conversation already started").into());
        }
        if !self.candidates.iter().any(|u| u.id == recipient_id) {
            return Err(ValidationError::MissingField("Please select a student").into());
        }

        let client = self.client.clone();
        let conversation = run_blocking(move || client.start_conversation(recipient_id)).await?;
        info!("Conversation {} ready with user {}", conversation.id, recipient_id);
        self.closed = true;
        Ok(conversation)
    }
}
