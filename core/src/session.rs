//! Session state and token persistence.
//!
//! # Design
//! `Session` mirrors the persisted token in memory and caches the current
//! user. The token is read from the `TokenStore` once, when the session
//! opens, and every mutation is written through. Whether a token is present
//! is the only thing that decides `SessionState`.

use tracing::debug;

use crate::error::StoreError;
use crate::types::User;

/// Persistent key-value slot holding a single bearer token.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&mut self, token: &str) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Process-lifetime store, used by tests and embedders that do not persist.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), StoreError> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.token = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::LoggedOut => "logged_out",
            SessionState::LoggedIn => "logged_in",
        }
    }
}

#[derive(Debug)]
pub struct Session<S: TokenStore> {
    store: S,
    token: Option<String>,
    current_user: Option<User>,
}

impl<S: TokenStore> Session<S> {
    /// Open a session, loading any token the store already holds.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let token = store.load()?.filter(|t| !t.trim().is_empty());
        debug!(has_token = token.is_some(), "session opened");
        Ok(Self {
            store,
            token,
            current_user: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn state(&self) -> SessionState {
        if self.token.is_some() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_token(&mut self, token: &str) -> Result<(), StoreError> {
        self.store.save(token)?;
        self.token = Some(token.to_string());
        Ok(())
    }

    pub fn set_user(&mut self, user: User) {
        self.current_user = Some(user);
    }

    /// Forget the token and user. Memory is always cleared, even when the
    /// store fails.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.token = None;
        self.current_user = None;
        self.store.clear()
    }
}
