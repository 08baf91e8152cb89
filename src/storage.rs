//! Secure credential storage using the OS credential store.
//!
//! On Windows this uses DPAPI (via the `keyring` crate), on macOS Keychain,
//! and on Linux the Secret Service API. This replaces the web deployment's
//! `localStorage` token handling, so the bearer token never touches disk in
//! plain text.

use keyring::Entry;
use tracing::warn;

const SERVICE_NAME: &str = "disem-admin";

// Credential keys
pub const KEY_AUTH_TOKEN: &str = "auth_token";
pub const KEY_API_BASE_URL: &str = "api_base_url";

/// All credential keys managed by this module.
const ALL_KEYS: &[&str] = &[KEY_AUTH_TOKEN, KEY_API_BASE_URL];

/// Retrieve a single credential from the OS keyring. Returns `None` when the
/// entry does not exist (or the platform returns a "not found" error).
pub fn get_credential(key: &str) -> Option<String> {
    let entry = match Entry::new(SERVICE_NAME, key) {
        Ok(e) => e,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to create entry");
            return None;
        }
    };
    match entry.get_password() {
        Ok(pw) => Some(pw),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to read credential");
            None
        }
    }
}

/// Store a credential in the OS keyring.
pub fn set_credential(key: &str, value: &str) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(|e| e.to_string())?;
    entry.set_password(value).map_err(|e| e.to_string())?;
    Ok(())
}

/// Delete a credential from the OS keyring. Silently succeeds if the entry
/// does not exist.
pub fn delete_credential(key: &str) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(|e| e.to_string())?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

pub fn has_credential(key: &str) -> bool {
    get_credential(key).is_some()
}

/// Delete every stored credential (sign-out everywhere / reset).
pub fn clear_all() -> Result<(), String> {
    for key in ALL_KEYS {
        delete_credential(key)?;
    }
    Ok(())
}
