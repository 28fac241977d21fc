//! User model shared by the session profile and conversation participants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a user (server-assigned)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of an account. Only employers may start conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Employer,
    Admin,
    #[serde(other)]
    Other,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Employer => "employer",
            UserType::Admin => "admin",
            UserType::Other => "other",
        }
    }
}

/// A user profile as returned by the API
///
/// Payloads vary between endpoints, so everything except the id and
/// username is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a minimal user with just an id and username
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: None,
            full_name: None,
            user_type: None,
            created_at: None,
        }
    }

    pub fn with_type(mut self, user_type: UserType) -> Self {
        self.user_type = Some(user_type);
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn is_employer(&self) -> bool {
        self.user_type == Some(UserType::Employer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_user() {
        let user: User = serde_json::from_str(r#"{"id": 1, "username": "a"}"#).unwrap();
        assert_eq!(user.id, UserId(1));
        assert_eq!(user.username, "a");
        assert_eq!(user.user_type, None);
        assert!(!user.is_employer());
    }

    #[test]
    fn test_deserialize_full_user() {
        let json = r#"{
            "id": 7,
            "email": "boss@corp.com",
            "username": "boss",
            "user_type": "employer",
            "full_name": "The Boss",
            "created_at": "2024-03-01T09:30:00.123456Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.is_employer());
        assert_eq!(user.full_name.as_deref(), Some("The Boss"));
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_unknown_user_type() {
        let user: User =
            serde_json::from_str(r#"{"id": 2, "username": "x", "user_type": "moderator"}"#)
                .unwrap();
        assert_eq!(user.user_type, Some(UserType::Other));
    }
}
