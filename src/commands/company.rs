//! Company info (configuracion/empresa) commands.
//!
//! The company record is a singleton. The backend signals "not created yet"
//! with a 404; that status is translated here into an explicit
//! `{configured: false}` variant so the rest of the app never has to treat
//! an HTTP status code as application state. Saving does an explicit
//! exists-check and picks POST (first save) or PATCH (subsequent edits).

use serde_json::Value;

use crate::gateway::Gateway;
use crate::session::SessionState;

const COMPANY_PATH: &str = "/configuracion/empresa";

/// Fetch the singleton. `Ok(None)` means not configured yet; every other
/// failure is a real error.
async fn fetch_company(gw: &Gateway) -> Result<Option<Value>, String> {
    match gw.fetch(COMPANY_PATH).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.to_string()),
    }
}

#[tauri::command]
pub async fn company_info_get(session: tauri::State<'_, SessionState>) -> Result<Value, String> {
    let gw = Gateway::from_session(&session);
    match fetch_company(&gw).await? {
        Some(data) => Ok(serde_json::json!({ "configured": true, "data": data })),
        None => Ok(serde_json::json!({ "configured": false, "data": Value::Null })),
    }
}

#[tauri::command]
pub async fn company_info_save(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing company payload")?;
    if !payload.is_object() {
        return Err("Company payload must be an object".into());
    }

    let gw = Gateway::from_session(&session);
    let saved = match fetch_company(&gw).await? {
        // First save creates the record, later saves patch it in place.
        None => gw.post(COMPANY_PATH, &payload).await,
        Some(_) => gw.patch(COMPANY_PATH, &payload).await,
    }
    .map_err(|e| e.to_string())?;

    Ok(serde_json::json!({ "configured": true, "data": saved }))
}
