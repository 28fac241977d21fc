//! Messaging crate - Client logic for the job-board messaging service
//!
//! This crate provides platform-independent messaging functionality including:
//! - Domain models (User, Conversation, Message, JobApplication)
//! - REST API client with bearer auth and single-flight token refresh
//! - Persistent session store with an expiry signal for front ends
//! - Polling synchronizers for the conversation list and active thread
//! - Attachment upload checks and safe downloads
//! - Display formatting helpers
//!
//! The crate has no UI dependencies. HTTP is synchronous; async callers go
//! through the synchronizers or [`sync::run_blocking`].

pub mod api;
pub mod attachments;
pub mod config;
pub mod error;
pub mod format;
pub mod initiator;
pub mod models;
pub mod session;
pub mod sync;

pub use api::{ApiClient, AuthResponse, OutboundFile, RegisterRequest, Transport, UreqTransport};
pub use attachments::{DraftFile, download_attachment, sanitize_file_name};
pub use self::config::ClientConfig;
pub use error::{ApiError, MAX_ATTACHMENT_BYTES, ValidationError, fallback, validate_attachment_size};
pub use format::{avatar_initial, display_name, format_file_size, format_message_time, format_relative, is_image_file};
pub use initiator::{ConversationInitiator, EMPLOYERS_ONLY};
pub use models::{
    ApplicationId, ApplicationStatus, Attachment, Conversation, ConversationId, JobApplication,
    Message, MessageId, MessagePreview, User, UserId, UserType,
};
pub use session::{Session, SessionStatus, SessionStore};
pub use sync::{
    ConversationState, ConversationSync, Draft, Inbox, MessageState, MessageSync, Poller,
    merge_messages, run_blocking,
};
