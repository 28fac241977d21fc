//! Authentication endpoints
//!
//! Login and registration store the returned session; they are sent without
//! the refresh-and-retry policy because a 401 there means bad credentials.

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::transport::ApiRequest;
use super::wire::UserResponse;
use super::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::models::{User, UserType};

/// Token pair and profile returned by login and registration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Registration form
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl ApiClient {
    /// Log in with email and password, storing the new session
    pub fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingField("Email and password are required").into());
        }

        let request = ApiRequest::post("/auth/login")
            .json(json!({ "email": email, "password": password }))
            .without_auth_retry();
        let auth: AuthResponse = self.send_json(request)?;
        self.store_session(auth)
    }

    /// Create an account, storing the new session
    pub fn register(&self, form: &RegisterRequest) -> Result<User, ApiError> {
        if form.email.trim().is_empty() || form.username.trim().is_empty() || form.password.is_empty() {
            return Err(
                ValidationError::MissingField("Email, username and password are required").into(),
            );
        }

        let request = ApiRequest::post("/auth/register")
            .json(serde_json::to_value(form)?)
            .without_auth_retry();
        let auth: AuthResponse = self.send_json(request)?;
        self.store_session(auth)
    }

    /// Fetch the profile of the signed-in user from the server
    pub fn me(&self) -> Result<User, ApiError> {
        let response: UserResponse = self.send_json(ApiRequest::get("/auth/me"))?;
        Ok(response.user)
    }

    /// Drop the local session. Tokens are not revoked server-side.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session()
            .clear()
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        info!("Logged out");
        Ok(())
    }

    fn store_session(&self, auth: AuthResponse) -> Result<User, ApiError> {
        self.session()
            .save(&auth.access_token, &auth.refresh_token, auth.user.clone())
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        info!("Signed in as {}", auth.user.username);
        Ok(auth.user)
    }
}
