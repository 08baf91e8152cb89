//! Authentication commands.
//!
//! Login posts credentials to the backend and keeps the returned bearer
//! token in the OS keyring via the session's token store. Logout clears and
//! zeroizes it. The backend owns credential verification; a 401 here is
//! surfaced with the server's own wording.

use serde_json::Value;
use tracing::info;

use crate::forms;
use crate::gateway::Gateway;
use crate::session::SessionState;
use crate::value_str;

const LOGIN_PATH: &str = "/auth/login";

#[tauri::command]
pub async fn auth_login(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing login payload")?;
    let email = forms::require_str(&payload, &["email", "correo"], "Email")?;
    let password = forms::require_str(&payload, &["password", "contrasena"], "Password")?;

    let gw = Gateway::from_session(&session);
    let body = serde_json::json!({ "email": email, "password": password });
    let response = gw.post(LOGIN_PATH, &body).await.map_err(|e| e.to_string())?;

    let token = value_str(&response, &["token", "access_token", "accessToken"])
        .ok_or("Login response did not include a token")?;
    let user = response
        .get("user")
        .or_else(|| response.get("usuario"))
        .cloned()
        .unwrap_or(Value::Null);

    session.establish(&token, user.clone())?;
    info!(email = %email, "login successful");

    Ok(serde_json::json!({ "success": true, "user": user }))
}

#[tauri::command]
pub async fn auth_logout(session: tauri::State<'_, SessionState>) -> Result<Value, String> {
    session.end()?;
    Ok(serde_json::json!({ "success": true }))
}

#[tauri::command]
pub async fn auth_current_session(
    session: tauri::State<'_, SessionState>,
) -> Result<Value, String> {
    Ok(serde_json::json!({
        "authenticated": session.is_authenticated(),
        "user": session.current_user(),
    }))
}
