//! Authentication token held in one place.
//!
//! The token is read from the store once, when the state is loaded at start-up.
//! After that every reader goes through [`AuthState::token`]; logging out
//! removes the row and forgets the in-memory copy together.

use crate::store::{KeyValueStore, StoreError};
use tracing::{debug, info};

/// Store row holding the token. Deliberately outside the embed cache prefix.
pub const TOKEN_KEY: &str = "eventscape.auth:token";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token must not be empty")]
    EmptyToken,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct AuthState<S> {
    store: S,
    token: Option<String>,
}

impl<S: KeyValueStore> AuthState<S> {
    /// Load the persisted token, if any.
    pub fn load(store: S) -> Result<Self, AuthError> {
        let token = store
            .get_item(TOKEN_KEY)?
            .filter(|t| !t.trim().is_empty());
        debug!(authenticated = token.is_some(), "auth state loaded");
        Ok(Self { store, token })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Persist a new token. The in-memory copy only changes once the write succeeds.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<(), AuthError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AuthError::EmptyToken);
        }
        self.store.set_item(TOKEN_KEY, &token)?;
        self.token = Some(token);
        info!("auth token stored");
        Ok(())
    }

    /// Log out: drop the persisted row and the in-memory token.
    pub fn clear(&mut self) -> Result<(), AuthError> {
        self.store.remove_item(TOKEN_KEY)?;
        self.token = None;
        info!("auth token cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn token_lifecycle() {
        let store = MemoryStore::new();
        let mut auth = AuthState::load(store.clone()).unwrap();
        assert!(!auth.is_authenticated());

        auth.set_token("abc123").unwrap();
        assert_eq!(auth.token(), Some("abc123"));
        assert_eq!(store.get_item(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));

        // A fresh load sees the persisted token.
        let reloaded = AuthState::load(store.clone()).unwrap();
        assert_eq!(reloaded.token(), Some("abc123"));

        auth.clear().unwrap();
        assert_eq!(auth.token(), None);
        assert_eq!(store.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn rejects_blank_token() {
        let mut auth = AuthState::load(MemoryStore::new()).unwrap();
        assert!(matches!(auth.set_token("   "), Err(AuthError::EmptyToken)));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn failed_write_keeps_previous_token() {
        let store = MemoryStore::with_quota(40);
        let mut auth = AuthState::load(store).unwrap();
        auth.set_token("short").unwrap();

        let err = auth.set_token("x".repeat(64)).unwrap_err();
        assert!(matches!(err, AuthError::Store(StoreError::QuotaExceeded { .. })));
        assert_eq!(auth.token(), Some("short"));
    }
}
