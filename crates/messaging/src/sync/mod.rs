//! Synchronizers that keep local view state in step with the server
//!
//! Each synchronizer owns a [`Poller`] and publishes its state through a
//! `tokio::sync::watch` channel. API calls are blocking, so they are
//! dispatched onto the blocking pool with [`run_blocking`].

mod conversations;
mod inbox;
mod messages;
mod poller;

pub use conversations::{ConversationState, ConversationSync};
pub use inbox::Inbox;
pub use messages::{Draft, MessageState, MessageSync, merge_messages};
pub use poller::Poller;

use crate::error::ApiError;

/// Run a blocking API call on the blocking thread pool
pub async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Network(format!("request task failed: {}", e)))?
}
