//! API gateway client
//!
//! Injects the bearer token into every request and handles expired access
//! tokens transparently: a 401 triggers one refresh through
//! `POST /auth/refresh` and exactly one retry of the original request.
//! Refreshes are single-flight; concurrent requests that hit a 401 wait for
//! the refresh already in progress instead of starting their own.

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};

use super::transport::{ApiRequest, ApiResponse, Transport, UreqTransport};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionStore;

/// Response from the refresh endpoint
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Client for the job-board REST API
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    /// Held while a refresh is in flight
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Create a client using a custom transport
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self {
            transport,
            session,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Create a client that talks HTTP to `config.api_url`
    pub fn from_config(config: &ClientConfig, session: Arc<SessionStore>) -> Self {
        info!("API client targeting {}", config.api_url);
        Self::new(Arc::new(UreqTransport::new(config)), session)
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Send a request, returning the successful response or an error.
    ///
    /// A 401 on a retryable request is answered by one token refresh and one
    /// retry. A 401 on the retry is returned as-is.
    pub fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let used_token = self.session.access_token();
        let response = self.dispatch(&request, used_token.as_deref())?;

        if response.status != 401 || !request.retry_on_unauthorized {
            return check_status(response);
        }

        debug!("{} {} returned 401; attempting refresh", request.method, request.path);
        let new_token = self.refresh_after_unauthorized(used_token.as_deref(), response)?;
        let retried = self.dispatch(&request, Some(&new_token))?;
        check_status(retried)
    }

    /// Send a request and decode its JSON body
    pub fn send_json<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request)?.decode()
    }

    fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<ApiResponse, ApiError> {
        let mut outbound = request.clone();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            outbound.set_header("Authorization", format!("Bearer {}", token));
        }
        self.transport.execute(&outbound)
    }

    /// Obtain a fresh access token after `used_token` was rejected
    fn refresh_after_unauthorized(
        &self,
        used_token: Option<&str>,
        unauthorized: ApiResponse,
    ) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another request refreshed while we were waiting for the lock
        if let Some(current) = self.session.access_token()
            && Some(current.as_str()) != used_token
        {
            debug!("Access token already refreshed by a concurrent request");
            return Ok(current);
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            warn!("Received 401 with no refresh token stored");
            self.session.expire();
            return Err(unauthorized.into_error());
        };

        match self.request_refresh(&refresh_token) {
            Ok(access_token) => {
                self.session
                    .replace_access_token(&access_token)
                    .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
                info!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                self.session.expire();
                Err(e)
            }
        }
    }

    /// Call the refresh endpoint directly, bypassing the retry policy
    fn request_refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let request = ApiRequest::post("/auth/refresh")
            .json(json!({ "refresh_token": refresh_token }))
            .without_auth_retry();
        let response = check_status(self.transport.execute(&request)?)?;
        let body: RefreshResponse = response.decode()?;
        Ok(body.access_token)
    }
}

fn check_status(response: ApiResponse) -> Result<ApiResponse, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(response.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockReply, MockTransport};
    use crate::api::transport::Method;
    use crate::models::User;
    use crate::session::SessionStatus;

    fn setup(access: Option<&str>, refresh: &str) -> (Arc<MockTransport>, ApiClient) {
        let mock = Arc::new(MockTransport::new());
        let session = Arc::new(SessionStore::in_memory());
        if let Some(access) = access {
            session.save(access, refresh, User::new(1, "a")).unwrap();
        }
        let client = ApiClient::new(mock.clone(), session);
        (mock, client)
    }

    fn bearer_of(request: &ApiRequest) -> Option<String> {
        request.header("Authorization").map(str::to_string)
    }

    #[test]
    fn test_bearer_header_attached_once() {
        let (mock, client) = setup(Some("t1"), "r1");
        mock.on(Method::Get, "/auth/me", ApiResponse::json(200, json!({})));

        let mut request = ApiRequest::get("/auth/me");
        request.set_header("Authorization", "Bearer stale");
        client.send(request).unwrap();

        let sent = &mock.requests()[0];
        let auth_headers: Vec<_> = sent
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth_headers.len(), 1);
        assert_eq!(bearer_of(sent).as_deref(), Some("Bearer t1"));
    }

    #[test]
    fn test_no_header_without_session() {
        let (mock, client) = setup(None, "");
        mock.on(Method::Post, "/auth/login", ApiResponse::json(200, json!({})));

        client.send(ApiRequest::post("/auth/login")).unwrap();
        assert!(bearer_of(&mock.requests()[0]).is_none());
    }

    #[test]
    fn test_refresh_and_retry_once() {
        let (mock, client) = setup(Some("t1"), "r1");
        mock.on_fn(Method::Get, "/messages/conversations", |request| {
            if request.header("Authorization") == Some("Bearer t2") {
                ApiResponse::json(200, json!({"conversations": []})).into()
            } else {
                ApiResponse::json(401, json!({"error": "Token has expired"})).into()
            }
        });
        mock.on(Method::Post, "/auth/refresh", ApiResponse::json(200, json!({"access_token": "t2"})));

        let response = client.send(ApiRequest::get("/messages/conversations")).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(client.session().access_token().as_deref(), Some("t2"));
        assert_eq!(mock.count(Method::Post, "/auth/refresh"), 1);
        assert_eq!(mock.count(Method::Get, "/messages/conversations"), 2);

        let refresh = mock
            .requests()
            .into_iter()
            .find(|r| r.path == "/auth/refresh")
            .unwrap();
        match refresh.body {
            crate::api::transport::RequestBody::Json(body) => {
                assert_eq!(body, json!({"refresh_token": "r1"}))
            }
            other => panic!("unexpected refresh body: {:?}", other),
        }
    }

    #[test]
    fn test_second_401_does_not_refresh_again() {
        let (mock, client) = setup(Some("t1"), "r1");
        mock.on(Method::Get, "/auth/me", ApiResponse::json(401, json!({"error": "Invalid token"})));
        mock.on(Method::Post, "/auth/refresh", ApiResponse::json(200, json!({"access_token": "t2"})));

        let err = client.send(ApiRequest::get("/auth/me")).unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(mock.count(Method::Post, "/auth/refresh"), 1);
        assert_eq!(mock.count(Method::Get, "/auth/me"), 2);
        // The refreshed token is kept; the retry's 401 does not log out
        assert!(client.session().has_session());
    }

    #[test]
    fn test_401_without_refresh_token_expires_session() {
        let (mock, client) = setup(Some("t1"), "");
        mock.on(Method::Get, "/auth/me", ApiResponse::json(401, json!({"error": "Token has expired"})));

        let err = client.send(ApiRequest::get("/auth/me")).unwrap_err();
        assert_eq!(err.user_message("x"), "Token has expired");
        assert_eq!(mock.count(Method::Post, "/auth/refresh"), 0);
        assert!(!client.session().has_session());
        assert_eq!(client.session().status(), SessionStatus::Expired);
    }

    #[test]
    fn test_refresh_failure_expires_session() {
        let (mock, client) = setup(Some("t1"), "r1");
        mock.on(Method::Get, "/auth/me", ApiResponse::json(401, json!({})));
        mock.on(
            Method::Post,
            "/auth/refresh",
            ApiResponse::json(401, json!({"error": "Refresh token has expired. Please login again."})),
        );

        let err = client.send(ApiRequest::get("/auth/me")).unwrap_err();
        assert_eq!(
            err.user_message("x"),
            "Refresh token has expired. Please login again."
        );
        assert_eq!(mock.count(Method::Get, "/auth/me"), 1);
        assert_eq!(client.session().status(), SessionStatus::Expired);
        assert!(client.session().current().is_none());
    }

    #[test]
    fn test_refresh_network_error_expires_session() {
        let (mock, client) = setup(Some("t1"), "r1");
        mock.on(Method::Get, "/auth/me", ApiResponse::json(401, json!({})));
        mock.on(Method::Post, "/auth/refresh", MockReply::NetworkError("refused".into()));

        assert!(matches!(
            client.send(ApiRequest::get("/auth/me")),
            Err(ApiError::Network(_))
        ));
        assert!(!client.session().has_session());
    }

    #[test]
    fn test_no_retry_when_opted_out() {
        let (mock, client) = setup(None, "");
        mock.on(
            Method::Post,
            "/auth/login",
            ApiResponse::json(401, json!({"error": "Invalid email or password"})),
        );

        let err = client
            .send(ApiRequest::post("/auth/login").without_auth_retry())
            .unwrap_err();
        assert_eq!(err.user_message("x"), "Invalid email or password");
        assert_eq!(mock.count(Method::Post, "/auth/refresh"), 0);
        assert_eq!(client.session().status(), SessionStatus::LoggedOut);
    }

    #[test]
    fn test_concurrent_401s_share_one_refresh() {
        let (mock, client) = setup(Some("t1"), "r1");
        mock.on_fn(Method::Get, "/auth/me", |request| {
            if request.header("Authorization") == Some("Bearer t2") {
                ApiResponse::json(200, json!({})).into()
            } else {
                ApiResponse::json(401, json!({})).into()
            }
        });
        mock.on_fn(Method::Post, "/auth/refresh", |_| {
            std::thread::sleep(std::time::Duration::from_millis(50));
            ApiResponse::json(200, json!({"access_token": "t2"})).into()
        });

        let client = Arc::new(client);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let client = client.clone();
                std::thread::spawn(move || client.send(ApiRequest::get("/auth/me")))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        assert_eq!(mock.count(Method::Post, "/auth/refresh"), 1);
    }
}
