//! Backend-connection settings commands.
//!
//! The settings screen can point the app at a different backend than the
//! environment provides; the override lives in the OS credential store next
//! to the bearer token and wins over every environment variable.

use serde_json::Value;

use crate::config;
use crate::session::SessionState;
use crate::storage;
use crate::value_str;

#[tauri::command]
pub async fn settings_backend_url_get() -> Result<Value, String> {
    Ok(serde_json::json!({
        "url": config::resolve_base_url(),
        "overridden": storage::has_credential(storage::KEY_API_BASE_URL),
    }))
}

/// Set (or clear, with an empty string) the backend URL override.
#[tauri::command]
pub async fn settings_backend_url_set(arg0: Option<Value>) -> Result<Value, String> {
    let raw = match arg0 {
        Some(Value::String(s)) => s,
        Some(ref v) => value_str(v, &["url", "baseUrl", "base_url"]).unwrap_or_default(),
        None => String::new(),
    };

    if raw.trim().is_empty() {
        storage::delete_credential(storage::KEY_API_BASE_URL)?;
    } else {
        let normalized = config::normalize_base_url(&raw);
        storage::set_credential(storage::KEY_API_BASE_URL, &normalized)?;
    }

    Ok(serde_json::json!({ "url": config::resolve_base_url() }))
}

/// Factory reset: end the session and drop every stored credential,
/// including the backend URL override.
#[tauri::command]
pub async fn settings_reset(session: tauri::State<'_, SessionState>) -> Result<Value, String> {
    session.end()?;
    storage::clear_all()?;
    Ok(serde_json::json!({ "success": true }))
}
