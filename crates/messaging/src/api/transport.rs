//! HTTP transport
//!
//! The API client talks to the server through the [`Transport`] trait so
//! that tests can substitute an in-memory implementation. The production
//! implementation uses synchronous HTTP (ureq) to stay executor-agnostic;
//! async callers dispatch requests with `spawn_blocking`.

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use super::multipart::Multipart;
use crate::config::ClientConfig;
use crate::error::{ApiError, MAX_ATTACHMENT_BYTES};

/// Upper bound on response bodies (attachments plus some headroom)
const MAX_RESPONSE_BYTES: u64 = MAX_ATTACHMENT_BYTES + 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Request payload; multipart forms are shared so a retried request reuses the bytes
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Arc<Multipart>),
}

/// A request relative to the API base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `/messages/conversations`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// Whether a 401 response may trigger a token refresh and one retry
    pub retry_on_unauthorized: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            retry_on_unauthorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn multipart(mut self, form: Multipart) -> Self {
        self.body = RequestBody::Multipart(Arc::new(form));
        self
    }

    /// Opt out of the refresh-and-retry policy (login, register, refresh)
    pub fn without_auth_retry(mut self) -> Self {
        self.retry_on_unauthorized = false;
        self
    }

    /// Set a header, replacing any existing value with the same name
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path plus encoded query string
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

/// A raw response from the server
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Error payload returned by the API (`{"error": "...", "details": "..."}`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: None,
            body,
        }
    }

    /// Build a JSON response
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: value.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// The server-provided error text, if the body carries one
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.error)
    }

    /// Convert a non-success response into an error
    pub fn into_error(self) -> ApiError {
        ApiError::Status {
            status: self.status,
            message: self.error_message(),
        }
    }
}

/// Executes requests against the API
pub trait Transport: Send + Sync {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Transport backed by a ureq agent
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.request_timeout))
            .build()
            .into();

        Self {
            agent,
            base_url: config.api_url.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path_and_query());
        debug!("{} {}", request.method, request.path);

        let result = match request.method {
            Method::Get => with_headers(self.agent.get(&url), &request.headers).call(),
            Method::Post => {
                let builder = with_headers(self.agent.post(&url), &request.headers);
                match &request.body {
                    RequestBody::Empty => builder.send_empty(),
                    RequestBody::Json(value) => builder.send_json(value),
                    RequestBody::Multipart(form) => {
                        let encoded = form.encode();
                        builder
                            .header("Content-Type", form.content_type().as_str())
                            .send(encoded.as_slice())
                    }
                }
            }
        };

        let mut response = result.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_vec()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        debug!("{} {} -> {}", request.method, request.path, status);
        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
