//! Conversation list synchronizer

use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use super::poller::Poller;
use super::run_blocking;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{Conversation, ConversationId};

/// Published conversation list state
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Conversations in server order (most recently updated first)
    pub conversations: Vec<Conversation>,
    pub selected: Option<Conversation>,
    /// True until the first fetch completes
    pub loading: bool,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            conversations: Vec::new(),
            selected: None,
            loading: true,
        }
    }
}

impl ConversationState {
    fn apply(&mut self, conversations: Vec<Conversation>) {
        if let Some(selected) = &self.selected
            && let Some(fresh) = conversations.iter().find(|c| c.id == selected.id)
        {
            self.selected = Some(fresh.clone());
        }
        self.conversations = conversations;
        self.loading = false;
    }
}

/// Keeps the conversation list fresh while active
pub struct ConversationSync {
    client: Arc<ApiClient>,
    interval: Duration,
    state: Arc<watch::Sender<ConversationState>>,
    poller: Mutex<Option<Poller>>,
}

impl ConversationSync {
    pub fn new(client: Arc<ApiClient>, interval: Duration) -> Self {
        let (state, _) = watch::channel(ConversationState::default());
        Self {
            client,
            interval,
            state: Arc::new(state),
            poller: Mutex::new(None),
        }
    }

    /// Start polling: one fetch now, then one per interval.
    ///
    /// Calling this while already active does nothing.
    pub fn activate(&self) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.as_ref().is_some_and(Poller::is_running) {
            return;
        }

        debug!("Conversation sync active (every {:?})", self.interval);
        let client = self.client.clone();
        let state = self.state.clone();
        *poller = Some(Poller::spawn(self.interval, move || {
            let client = client.clone();
            let state = state.clone();
            async move {
                if let Err(e) = fetch_into(client, &state).await {
                    warn!("Failed to load conversations: {}", e);
                    state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
                }
            }
        }));
    }

    /// Stop polling. Results of a fetch still in flight are discarded.
    pub fn deactivate(&self) {
        if let Some(poller) = self.poller.lock().unwrap_or_else(PoisonError::into_inner).take() {
            poller.stop();
            debug!("Conversation sync stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Poller::is_running)
    }

    /// Fetch immediately, outside the regular schedule.
    ///
    /// Does nothing while inactive; use [`refresh`](Self::refresh) for a one-off fetch.
    pub fn refresh_now(&self) {
        match self.poller.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(poller) => poller.trigger(),
            None => debug!("Conversation sync inactive, refresh skipped"),
        }
    }

    /// Fetch once and wait for the result
    pub async fn refresh(&self) -> Result<Vec<Conversation>, ApiError> {
        fetch_into(self.client.clone(), &self.state).await?;
        Ok(self.state.borrow().conversations.clone())
    }

    pub fn select(&self, conversation: Conversation) {
        self.state.send_modify(|s| s.selected = Some(conversation));
    }

    pub fn clear_selection(&self) {
        self.state.send_if_modified(|s| s.selected.take().is_some());
    }

    pub fn selected(&self) -> Option<Conversation> {
        self.state.borrow().selected.clone()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.borrow().conversations.clone()
    }

    pub fn find(&self, id: ConversationId) -> Option<Conversation> {
        self.state
            .borrow()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn snapshot(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }
}

async fn fetch_into(
    client: Arc<ApiClient>,
    state: &watch::Sender<ConversationState>,
) -> Result<(), ApiError> {
    let conversations = run_blocking(move || client.list_conversations()).await?;
    debug!("Loaded {} conversations", conversations.len());
    state.send_modify(|s| s.apply(conversations));
    Ok(())
}
