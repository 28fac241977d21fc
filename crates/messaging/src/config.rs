//! Client configuration
//!
//! The API base URL is resolved from (in order of priority):
//! 1. Compile-time `HIRECHAT_API_URL` (for packaged builds)
//! 2. `client.json` in the hirechat config directory
//! 3. Runtime `HIRECHAT_API_URL` environment variable
//! 4. The development fallback, `http://localhost:8000/api`

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Client config filename in the hirechat config directory
const CLIENT_CONFIG_FILE: &str = "client.json";

/// Environment variable holding the API base URL
pub const API_URL_ENV: &str = "HIRECHAT_API_URL";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Runtime settings for the API client and synchronizers
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including the `/api` prefix, without a trailing slash
    pub api_url: String,
    /// Cadence of the conversation list poll
    pub conversation_poll_interval: Duration,
    /// Cadence of the message poll for the selected conversation
    pub message_poll_interval: Duration,
    /// Page size requested when fetching messages
    pub messages_per_page: u32,
    /// Overall timeout applied to each HTTP request
    pub request_timeout: Duration,
}

/// On-disk format of `client.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct ClientConfigFile {
    api_url: Option<String>,
    conversation_poll_secs: Option<u64>,
    message_poll_secs: Option<u64>,
    messages_per_page: Option<u32>,
    request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            conversation_poll_interval: Duration::from_secs(5),
            message_poll_interval: Duration::from_secs(3),
            messages_per_page: 50,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration using the priority order described above
    pub fn load() -> Result<Self> {
        let file = if config::config_exists(CLIENT_CONFIG_FILE) {
            config::load_json::<ClientConfigFile>(CLIENT_CONFIG_FILE)?
        } else {
            ClientConfigFile::default()
        };

        let api_url = Self::api_url_from_compile_time()
            .or_else(|| file.api_url.clone())
            .or_else(|| std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self::from_parts(api_url, file)
    }

    /// Load configuration from a specific JSON file, ignoring the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: ClientConfigFile = config::load_json_file(path)?;
        let api_url = file
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::from_parts(api_url, file)
    }

    /// Build a config for an explicit base URL with default cadences
    pub fn with_api_url(api_url: &str) -> Result<Self> {
        Self::from_parts(api_url.to_string(), ClientConfigFile::default())
    }

    fn api_url_from_compile_time() -> Option<String> {
        let url = option_env!("HIRECHAT_API_URL")?;
        if url.is_empty() {
            return None;
        }
        Some(url.to_string())
    }

    fn from_parts(api_url: String, file: ClientConfigFile) -> Result<Self> {
        let defaults = Self::default();
        for (name, value) in [
            ("conversation_poll_secs", file.conversation_poll_secs),
            ("message_poll_secs", file.message_poll_secs),
            ("request_timeout_secs", file.request_timeout_secs),
            ("messages_per_page", file.messages_per_page.map(u64::from)),
        ] {
            if value == Some(0) {
                anyhow::bail!("{} must be greater than zero", name);
            }
        }
        Ok(Self {
            api_url: normalize_api_url(&api_url)?,
            conversation_poll_interval: file
                .conversation_poll_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.conversation_poll_interval),
            message_poll_interval: file
                .message_poll_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.message_poll_interval),
            messages_per_page: file.messages_per_page.unwrap_or(defaults.messages_per_page),
            request_timeout: file
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        })
    }
}

/// Validate a base URL and strip trailing slashes
fn normalize_api_url(input: &str) -> Result<String> {
    let trimmed = input.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .with_context(|| format!("Invalid API URL: {}", input))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("API URL must use http or https: {}", input);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert_eq!(config.conversation_poll_interval, Duration::from_secs(5));
        assert_eq!(config.message_poll_interval, Duration::from_secs(3));
        assert_eq!(config.messages_per_page, 50);
    }

    #[test]
    fn test_with_api_url_trims_trailing_slash() {
        let config = ClientConfig::with_api_url("https://jobs.example.com/api/").unwrap();
        assert_eq!(config.api_url, "https://jobs.example.com/api");
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(ClientConfig::with_api_url("not a url").is_err());
        assert!(ClientConfig::with_api_url("ftp://example.com/api").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(
            &path,
            r#"{"api_url": "https://api.example.com/api", "message_poll_secs": 10}"#,
        )
        .unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.api_url, "https://api.example.com/api");
        assert_eq!(config.message_poll_interval, Duration::from_secs(10));
        assert_eq!(config.conversation_poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_from_file_rejects_zero_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.json");

        std::fs::write(&path, r#"{"message_poll_secs": 0}"#).unwrap();
        let err = ClientConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("message_poll_secs"));

        std::fs::write(&path, r#"{"conversation_poll_secs": 0}"#).unwrap();
        assert!(ClientConfig::from_file(&path).is_err());

        std::fs::write(&path, r#"{"messages_per_page": 0}"#).unwrap();
        assert!(ClientConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_from_file_without_url_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, "{}").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
