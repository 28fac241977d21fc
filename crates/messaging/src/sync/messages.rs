//! Message thread synchronizer
//!
//! Tracks the messages of one active conversation. Activating a
//! conversation cancels the previous thread's poller before the new one
//! starts, so there is never more than one message timer. The unread count
//! is reset once per activation, after the first fetch.
//!
//! Each poll replaces the thread with the newest page-sized window of the
//! server's copy, so long threads still show their latest messages. Messages this
//! client sent are echoed locally right away and kept until a poll returns
//! them, so a send never appears to vanish between the send response and
//! the next poll.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use super::poller::Poller;
use super::run_blocking;
use crate::api::ApiClient;
use crate::attachments::{DraftFile, download_attachment};
use crate::error::{ApiError, ValidationError, fallback};
use crate::models::{Attachment, ConversationId, Message, MessageId};

/// Unsent composer contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub text: String,
    pub file: Option<DraftFile>,
}

impl Draft {
    /// Whether there is anything to send
    pub fn is_sendable(&self) -> bool {
        !self.text.trim().is_empty() || self.file.is_some()
    }
}

/// Published thread state
#[derive(Debug, Clone, Default)]
pub struct MessageState {
    pub conversation_id: Option<ConversationId>,
    pub messages: Vec<Message>,
    pub loading: bool,
    pub sending: bool,
    pub draft: Draft,
    /// Inline error for the composer (rejected file, failed send)
    pub error: Option<String>,
    /// Sent messages not yet seen in a poll result
    pending_echoes: Vec<Message>,
}

/// Replace the thread with a fresh server copy, keeping unconfirmed echoes.
///
/// Echoes whose ids the server returned are dropped; the rest are appended
/// after the server messages.
pub fn merge_messages(server: Vec<Message>, echoes: &mut Vec<Message>) -> Vec<Message> {
    let seen: HashSet<MessageId> = server.iter().map(|m| m.id).collect();
    echoes.retain(|m| !seen.contains(&m.id));

    let mut merged = server;
    merged.extend(echoes.iter().cloned());
    merged
}

/// Keeps one conversation thread fresh while active
pub struct MessageSync {
    client: Arc<ApiClient>,
    interval: Duration,
    per_page: u32,
    state: Arc<watch::Sender<MessageState>>,
    poller: Mutex<Option<Poller>>,
}

impl MessageSync {
    pub fn new(client: Arc<ApiClient>, interval: Duration, per_page: u32) -> Self {
        let (state, _) = watch::channel(MessageState::default());
        Self {
            client,
            interval,
            per_page,
            state: Arc::new(state),
            poller: Mutex::new(None),
        }
    }

    /// Show a conversation, replacing whatever was active
    pub fn activate(&self, conversation_id: ConversationId) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = poller.take() {
            previous.stop();
        }

        self.state.send_replace(MessageState {
            conversation_id: Some(conversation_id),
            loading: true,
            ..MessageState::default()
        });
        debug!("Message sync active for conversation {}", conversation_id);

        let client = self.client.clone();
        let state = self.state.clone();
        let per_page = self.per_page;
        let acknowledged = Arc::new(AtomicBool::new(false));

        *poller = Some(Poller::spawn(self.interval, move || {
            let client = client.clone();
            let state = state.clone();
            let acknowledged = acknowledged.clone();
            async move {
                poll_once(&client, &state, conversation_id, per_page).await;

                if !acknowledged.swap(true, Ordering::SeqCst) {
                    let client = client.clone();
                    if let Err(e) = run_blocking(move || client.mark_read(conversation_id)).await {
                        warn!("Failed to mark conversation {} read: {}", conversation_id, e);
                    }
                }
            }
        }));
    }

    /// Stop polling and clear the thread
    pub fn deactivate(&self) {
        if let Some(poller) = self.poller.lock().unwrap_or_else(PoisonError::into_inner).take() {
            poller.stop();
        }
        self.state.send_replace(MessageState::default());
    }

    pub fn is_active(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Poller::is_running)
    }

    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.state.borrow().conversation_id
    }

    /// Poll immediately, outside the regular schedule
    pub fn refresh_now(&self) {
        if let Some(poller) = self.poller.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            poller.trigger();
        }
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|s| s.draft.text = text);
    }

    /// Attach a local file to the draft.
    ///
    /// Oversized or unreadable files leave the draft without a file and
    /// set the inline error.
    pub fn attach_file(&self, path: impl AsRef<Path>) -> Result<(), ApiError> {
        match DraftFile::inspect(path) {
            Ok(file) => {
                self.state.send_modify(|s| {
                    s.draft.file = Some(file);
                    s.error = None;
                });
                Ok(())
            }
            Err(e) => {
                let message = e.user_message(&e.to_string());
                self.state.send_modify(|s| {
                    s.draft.file = None;
                    s.error = Some(message);
                });
                Err(e)
            }
        }
    }

    pub fn remove_file(&self) {
        self.state.send_if_modified(|s| s.draft.file.take().is_some());
    }

    /// Send the current draft.
    ///
    /// An empty draft is rejected without a request. On success the
    /// confirmed message is appended and the draft cleared; on failure the
    /// draft is kept and the inline error set.
    pub async fn send(&self) -> Result<Message, ApiError> {
        let (conversation_id, draft) = {
            let state = self.state.borrow();
            (state.conversation_id, state.draft.clone())
        };
        let Some(conversation_id) = conversation_id else {
            return Err(ValidationError::MissingField("No conversation selected").into());
        };
        if !draft.is_sendable() {
            return Err(ValidationError::EmptyMessage.into());
        }

        self.state.send_modify(|s| {
            s.sending = true;
            s.error = None;
        });

        let client = self.client.clone();
        let outgoing = draft.clone();
        let result = run_blocking(move || {
            let file = outgoing.file.as_ref().map(DraftFile::load).transpose()?;
            client.send_message(conversation_id, Some(&outgoing.text), file)
        })
        .await;

        match result {
            Ok(message) => {
                info!("Sent message {} to conversation {}", message.id, conversation_id);
                self.state.send_modify(|s| {
                    s.sending = false;
                    if s.conversation_id != Some(conversation_id) {
                        return;
                    }
                    if !s.messages.iter().any(|m| m.id == message.id) {
                        s.messages.push(message.clone());
                        s.pending_echoes.push(message.clone());
                    }
                    if s.draft == draft {
                        s.draft = Draft::default();
                    }
                });
                Ok(message)
            }
            Err(e) => {
                warn!("Failed to send message: {}", e);
                let message = e.user_message(fallback::SEND_MESSAGE);
                self.state.send_modify(|s| {
                    s.sending = false;
                    if s.conversation_id == Some(conversation_id) {
                        s.error = Some(message);
                    }
                });
                Err(e)
            }
        }
    }

    /// Save a message's attachment into `dir`
    pub async fn download(&self, attachment: &Attachment, dir: impl Into<PathBuf>) -> Result<PathBuf, ApiError> {
        let client = self.client.clone();
        let stored = attachment.file_path.clone();
        let display = attachment.file_name.clone();
        let dir = dir.into();
        run_blocking(move || download_attachment(&client, &stored, &display, &dir)).await
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.borrow().messages.clone()
    }

    pub fn snapshot(&self) -> MessageState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MessageState> {
        self.state.subscribe()
    }
}

async fn poll_once(
    client: &Arc<ApiClient>,
    state: &watch::Sender<MessageState>,
    conversation_id: ConversationId,
    per_page: u32,
) {
    let client = client.clone();
    match run_blocking(move || client.latest_messages(conversation_id, per_page)).await {
        Ok(server) => {
            state.send_modify(|s| {
                if s.conversation_id != Some(conversation_id) {
                    return;
                }
                let mut echoes = std::mem::take(&mut s.pending_echoes);
                s.messages = merge_messages(server, &mut echoes);
                s.pending_echoes = echoes;
                s.loading = false;
            });
        }
        Err(e) => {
            warn!("Failed to load messages for conversation {}: {}", conversation_id, e);
            state.send_if_modified(|s| {
                s.conversation_id == Some(conversation_id) && std::mem::replace(&mut s.loading, false)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i64) -> Message {
        Message::builder(id, 1, 1).content(format!("m{}", id)).build()
    }

    fn ids(messages: &[Message]) -> Vec<i64> {
        messages.iter().map(|m| m.id.as_i64()).collect()
    }

    #[test]
    fn test_merge_keeps_unconfirmed_echo() {
        let mut echoes = vec![message(3)];
        let merged = merge_messages(vec![message(1), message(2)], &mut echoes);
        assert_eq!(ids(&merged), vec![1, 2, 3]);
        assert_eq!(echoes.len(), 1);
    }

    #[test]
    fn test_merge_drops_confirmed_echo() {
        let mut echoes = vec![message(3)];
        let merged = merge_messages(vec![message(1), message(2), message(3)], &mut echoes);
        assert_eq!(ids(&merged), vec![1, 2, 3]);
        assert!(echoes.is_empty());
    }

    #[test]
    fn test_merge_replaces_rather_than_accumulates() {
        let mut echoes = Vec::new();
        let merged = merge_messages(vec![message(5)], &mut echoes);
        assert_eq!(ids(&merged), vec![5]);
    }

    #[test]
    fn test_draft_sendable() {
        assert!(!Draft::default().is_sendable());
        assert!(!Draft { text: "   ".into(), file: None }.is_sendable());
        assert!(Draft { text: "hi".into(), file: None }.is_sendable());
        let file = DraftFile {
            path: PathBuf::from("/tmp/cv.pdf"),
            file_name: "cv.pdf".into(),
            size: 10,
        };
        assert!(Draft { text: String::new(), file: Some(file) }.is_sendable());
    }
}
