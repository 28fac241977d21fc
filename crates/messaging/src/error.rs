//! Error types for client operations

/// Largest attachment the client will upload (50 MiB)
pub const MAX_ATTACHMENT_BYTES: u64 = 50 * 1024 * 1024;

/// Generic messages shown when the server gives no error text
pub mod fallback {
    pub const LOGIN: &str = "Login failed. Please try again.";
    pub const REGISTER: &str = "Registration failed. Please try again.";
    pub const SEND_MESSAGE: &str = "Failed to send message";
    pub const START_CONVERSATION: &str = "Failed to start conversation";
    pub const LOAD_STUDENTS: &str = "Failed to load students";
    pub const LOAD_CONVERSATIONS: &str = "Failed to load conversations";
    pub const DOWNLOAD_FILE: &str = "Failed to download file";
}

/// Errors caught locally, before any network call is made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Message content or file is required")]
    EmptyMessage,
    #[error("File size must be less than 50MB")]
    FileTooLarge { size: u64 },
    #[error("{0}")]
    MissingField(&'static str),
}

/// Errors returned by API operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered with a non-success status
    #[error("HTTP {status}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status {
        status: u16,
        /// The `error` field of the response body, when present
        message: Option<String>,
    },

    /// Rejected locally because the current user lacks the required role
    #[error("{0}")]
    Forbidden(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to persist session: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// The HTTP status, if the server produced this error
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Text suitable for showing to the user.
    ///
    /// Server-provided error text and local validation messages win;
    /// everything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Validation(e) => e.to_string(),
            ApiError::Forbidden(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Check an attachment size against the upload policy
pub fn validate_attachment_size(size: u64) -> Result<(), ValidationError> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(ValidationError::FileTooLarge { size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_size_boundary() {
        assert!(validate_attachment_size(52_428_800).is_ok());
        assert_eq!(
            validate_attachment_size(52_428_801),
            Err(ValidationError::FileTooLarge { size: 52_428_801 })
        );
        assert!(validate_attachment_size(0).is_ok());
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::Status {
            status: 400,
            message: Some("File type not allowed".to_string()),
        };
        assert_eq!(err.user_message("Failed to send message"), "File type not allowed");
    }

    #[test]
    fn test_user_message_fallback() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message("Failed to send message"), "Failed to send message");

        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.user_message("Failed to send message"), "Failed to send message");
    }

    #[test]
    fn test_status_display() {
        let err = ApiError::Status {
            status: 403,
            message: Some("Access denied".to_string()),
        };
        assert_eq!(err.to_string(), "HTTP 403: Access denied");
        assert!(!err.is_unauthorized());
    }
}
