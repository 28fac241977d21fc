//! Domain models for the messaging and job-board entities

mod conversation;
mod job;
mod message;
mod user;

pub use conversation::{Conversation, ConversationId, MessagePreview};
pub use job::{ApplicationId, ApplicationStatus, JobApplication};
pub use message::{Attachment, Message, MessageId};
pub use user::{User, UserId, UserType};
