//! Session store
//!
//! Holds the access token, refresh token and user profile for the signed-in
//! account. The session is persisted as a single JSON document so that all
//! three values are written (and removed) together.
//!
//! The store is an explicit object: open it once at startup and share it
//! (via `Arc`) with the API client and any views that need the current user.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;

use crate::models::User;

/// Session filename in the hirechat config directory
const SESSION_FILE: &str = "session.json";

/// Persisted session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

/// Lifecycle state published to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// An access token is stored
    Active,
    /// No session (never logged in, or logged out by the user)
    LoggedOut,
    /// The session was dropped because it could not be refreshed.
    /// Views should return to the login screen.
    Expired,
}

/// Durable store for the current session
pub struct SessionStore {
    /// Backing file; `None` keeps the session in memory only
    path: Option<PathBuf>,
    session: RwLock<Option<Session>>,
    status: watch::Sender<SessionStatus>,
}

impl SessionStore {
    /// Open the store at the default location (~/.config/hirechat/session.json)
    pub fn open_default() -> Result<Self> {
        let path = config::config_path(SESSION_FILE).context("Could not determine config directory")?;
        Self::open(path)
    }

    /// Open the store backed by the given file, loading any saved session.
    ///
    /// An unreadable or corrupt file is logged and treated as no session.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let session = if path.exists() {
            match config::load_json_file::<Session>(&path) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!("Ignoring unreadable session file: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::with_state(Some(path), session))
    }

    /// Create a store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::with_state(None, None)
    }

    fn with_state(path: Option<PathBuf>, session: Option<Session>) -> Self {
        let status = if session.is_some() {
            SessionStatus::Active
        } else {
            SessionStatus::LoggedOut
        };
        let (tx, _rx) = watch::channel(status);
        Self {
            path,
            session: RwLock::new(session),
            status: tx,
        }
    }

    /// Persist a new session, replacing any existing one
    pub fn save(&self, access_token: &str, refresh_token: &str, user: User) -> Result<()> {
        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: Some(refresh_token.to_string()).filter(|t| !t.is_empty()),
            user,
        };
        self.persist(Some(&session))?;
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        self.status.send_replace(SessionStatus::Active);
        Ok(())
    }

    /// Replace only the access token, keeping the refresh token and profile
    pub fn replace_access_token(&self, access_token: &str) -> Result<()> {
        let mut guard = self.session.write().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = guard.as_ref() else {
            anyhow::bail!("No session to update");
        };
        let updated = Session {
            access_token: access_token.to_string(),
            ..current.clone()
        };
        self.persist(Some(&updated))?;
        *guard = Some(updated);
        Ok(())
    }

    /// Remove the session (user-initiated logout)
    pub fn clear(&self) -> Result<()> {
        self.drop_session(SessionStatus::LoggedOut)
    }

    /// Remove the session because it can no longer be refreshed
    pub fn expire(&self) {
        info!("Session expired; login required");
        if let Err(e) = self.drop_session(SessionStatus::Expired) {
            warn!("Failed to remove expired session: {:#}", e);
        }
    }

    fn drop_session(&self, status: SessionStatus) -> Result<()> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.status.send_replace(status);
        self.persist(None)
    }

    fn persist(&self, session: Option<&Session>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match session {
            Some(session) => config::save_json_file(path, session),
            None => config::remove_file(path),
        }
    }

    /// The signed-in user, if any
    pub fn current(&self) -> Option<User> {
        self.read(|s| s.user.clone())
    }

    /// Whether an access token is stored
    pub fn has_session(&self) -> bool {
        self.read(|s| !s.access_token.is_empty()).unwrap_or(false)
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(|s| s.refresh_token.clone()).flatten()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Watch lifecycle changes (login, logout, expiry)
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    fn read<T>(&self, f: impl FnOnce(&Session) -> T) -> Option<T> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}
