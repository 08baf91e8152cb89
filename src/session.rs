//! Authenticated session state.
//!
//! Holds the logged-in user and the bearer token behind a `TokenStore`
//! trait, so credential-store specifics never leak into business logic and
//! tests can run against an in-memory store. The token is zeroized in
//! memory when a session ends.

use serde_json::Value;
use std::sync::Mutex;
use tracing::info;
use zeroize::Zeroize;

use crate::storage;

/// Where the bearer token lives between launches.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), String>;
    fn clear(&self) -> Result<(), String>;
}

/// Production store: the OS keyring.
pub struct KeyringTokenStore;

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Option<String> {
        storage::get_credential(storage::KEY_AUTH_TOKEN)
    }

    fn save(&self, token: &str) -> Result<(), String> {
        storage::set_credential(storage::KEY_AUTH_TOKEN, token)
    }

    fn clear(&self) -> Result<(), String> {
        storage::delete_credential(storage::KEY_AUTH_TOKEN)
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

#[cfg(test)]
impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn save(&self, token: &str) -> Result<(), String> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), String> {
        if let Some(mut old) = self.token.lock().unwrap().take() {
            old.zeroize();
        }
        Ok(())
    }
}

/// Tauri managed state for the current session.
pub struct SessionState {
    store: Box<dyn TokenStore>,
    user: Mutex<Option<Value>>,
}

impl SessionState {
    pub fn new(store: Box<dyn TokenStore>) -> Self {
        Self {
            store,
            user: Mutex::new(None),
        }
    }

    /// Record a fresh login: persist the token and keep the user payload
    /// for the session screen.
    pub fn establish(&self, token: &str, user: Value) -> Result<(), String> {
        self.store.save(token)?;
        *self.user.lock().unwrap() = Some(user);
        info!("session established");
        Ok(())
    }

    /// End the session: drop the user, clear and zeroize the token.
    pub fn end(&self) -> Result<(), String> {
        *self.user.lock().unwrap() = None;
        if let Some(mut token) = self.store.load() {
            token.zeroize();
        }
        self.store.clear()?;
        info!("session ended");
        Ok(())
    }

    /// The bearer token for outgoing requests, if any.
    pub fn bearer_token(&self) -> Option<String> {
        self.store.load().filter(|t| !t.trim().is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// The user payload echoed by the backend at login, or null. A token
    /// surviving a restart yields an authenticated session with no cached
    /// user until the frontend re-fetches the profile.
    pub fn current_user(&self) -> Value {
        self.user.lock().unwrap().clone().unwrap_or(Value::Null)
    }
}
