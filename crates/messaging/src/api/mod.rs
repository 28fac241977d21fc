//! REST API integration
//!
//! This module provides:
//! - The HTTP transport seam and its ureq implementation
//! - The gateway client with bearer injection and token refresh
//! - Typed bindings for the auth, messaging, users and jobs endpoints
//! - Response normalization to domain models

mod auth;
mod client;
mod conversations;
mod jobs;
pub mod mock;
mod multipart;
mod normalize;
mod transport;
mod users;

pub use auth::{AuthResponse, RegisterRequest};
pub use client::ApiClient;
pub use conversations::OutboundFile;
pub use multipart::{Multipart, Part};
pub use normalize::{EmptyMessageRecord, normalize_message};
pub use transport::{ApiRequest, ApiResponse, Method, RequestBody, Transport, UreqTransport};

/// Wire response types
pub mod wire {
    use serde::Deserialize;

    use crate::models::{Conversation, JobApplication, User};

    /// Message as serialized by the server
    #[derive(Debug, Clone, Deserialize)]
    pub struct MessageRecord {
        pub id: i64,
        pub conversation_id: i64,
        pub sender_id: i64,
        #[serde(default)]
        pub content: Option<String>,
        pub created_at: chrono::DateTime<chrono::Utc>,
        #[serde(default)]
        pub is_system_message: bool,
        #[serde(default)]
        pub has_attachment: bool,
        #[serde(default)]
        pub file_name: Option<String>,
        #[serde(default)]
        pub file_path: Option<String>,
        #[serde(default)]
        pub file_size: Option<u64>,
        #[serde(default)]
        pub file_type: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ConversationsResponse {
        pub conversations: Vec<Conversation>,
    }

    #[derive(Debug, Deserialize)]
    pub struct MessagesResponse {
        pub messages: Vec<MessageRecord>,
        #[serde(default)]
        pub total: Option<u64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SendMessageResponse {
        pub data: MessageRecord,
    }

    #[derive(Debug, Deserialize)]
    pub struct StartConversationResponse {
        pub conversation: Conversation,
    }

    #[derive(Debug, Deserialize)]
    pub struct UserResponse {
        pub user: User,
    }

    #[derive(Debug, Deserialize)]
    pub struct StudentsResponse {
        pub students: Vec<User>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ApplicationResponse {
        pub application: JobApplication,
    }

    #[derive(Debug, Deserialize)]
    pub struct ApplicationsResponse {
        pub applications: Vec<JobApplication>,
    }
}
