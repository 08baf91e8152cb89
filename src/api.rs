//! Low-level HTTP transport to the back-office REST API.
//!
//! Everything that talks to the backend goes through here: bearer-token
//! injection, timeouts, and the mapping of transport failures and error
//! bodies into a single typed taxonomy. Validation messages reported by the
//! backend (`{message: string | string[] | object}`) are surfaced verbatim
//! so forms can show exactly what the server rejected.

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for multipart uploads, which may carry banner images.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Typed failure of a backend call. Every gateway operation returns this;
/// no operation silently maps a failure to an empty result.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Cannot reach backend at {url}")]
    Transport { url: String },
    #[error("Request to {url} timed out")]
    Timeout { url: String },
    /// Non-2xx response. `message` is the server's own wording when the
    /// body carried one, otherwise a generic per-status description.
    #[error("{message}")]
    Status { code: u16, message: String },
    #[error("Invalid JSON from backend: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Config(String),
}

impl ApiError {
    /// True for HTTP 404. The company-info singleton uses this to mean
    /// "not configured yet" rather than a hard failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { code: 404, .. })
    }
}

/// Convert a `reqwest::Error` into the typed taxonomy.
fn transport_error(url: &str, err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout {
            url: url.to_string(),
        };
    }
    ApiError::Transport {
        url: url.to_string(),
    }
}

/// Generic per-status description, used when the body has no message.
fn status_fallback(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Session expired or invalid".to_string(),
        403 => "Not authorized for this operation".to_string(),
        404 => "Resource not found".to_string(),
        409 => "The request conflicts with existing data".to_string(),
        s if s >= 500 => format!("Backend server error (HTTP {s})"),
        s => format!("Unexpected response from backend (HTTP {s})"),
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend reports validation failures as `{message: ...}` where the
/// value can be a string, an array of strings (one per failed field), or an
/// object. Arrays are joined; objects are stringified; nothing is dropped.
pub(crate) fn extract_server_message(body: &Value) -> Option<String> {
    let raw = body.get("message").or_else(|| body.get("error"))?;
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(parts) => {
            let joined: Vec<String> = parts
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join(", "))
            }
        }
        Value::Object(_) => Some(raw.to_string()),
        _ => None,
    }
}

async fn error_from_response(resp: reqwest::Response) -> ApiError {
    let status = resp.status();
    let body_text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body_text)
        .ok()
        .as_ref()
        .and_then(extract_server_message)
        .unwrap_or_else(|| status_fallback(status));
    ApiError::Status {
        code: status.as_u16(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Request plumbing
// ---------------------------------------------------------------------------

fn build_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Perform an authenticated JSON request against the backend.
///
/// `path` includes the leading slash, e.g. `/clientes`. Query parameters are
/// appended as-is. Empty (204) responses come back as `Value::Null`.
pub async fn request_json(
    base_url: &str,
    token: Option<&str>,
    method: Method,
    path: &str,
    query: &[(String, String)],
    body: Option<&Value>,
) -> Result<Value, ApiError> {
    let url = format!("{base_url}{path}");
    let client = build_client(DEFAULT_TIMEOUT)?;

    let mut req = client.request(method, &url);
    if !query.is_empty() {
        req = req.query(query);
    }
    if let Some(tok) = token {
        req = req.bearer_auth(tok);
    }
    if let Some(b) = body {
        req = req.json(b);
    }

    let resp = req.send().await.map_err(|e| {
        warn!(url = %url, error = %e, "backend request failed");
        transport_error(base_url, &e)
    })?;

    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }

    let body_text = resp
        .text()
        .await
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    if body_text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body_text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Upload a file as `multipart/form-data` (banner images).
pub async fn upload_multipart(
    base_url: &str,
    token: Option<&str>,
    method: Method,
    path: &str,
    field_name: &str,
    file_name: &str,
    mime_type: &str,
    bytes: Vec<u8>,
) -> Result<Value, ApiError> {
    let url = format!("{base_url}{path}");
    let client = build_client(UPLOAD_TIMEOUT)?;

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime_type)
        .map_err(|e| ApiError::Config(format!("Invalid MIME type {mime_type}: {e}")))?;
    let form = reqwest::multipart::Form::new().part(field_name.to_string(), part);

    let mut req = client.request(method, &url).multipart(form);
    if let Some(tok) = token {
        req = req.bearer_auth(tok);
    }

    let resp = req
        .send()
        .await
        .map_err(|e| transport_error(base_url, &e))?;

    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }

    let body_text = resp
        .text()
        .await
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    if body_text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body_text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_string() {
        let body = serde_json::json!({ "message": "El documento ya existe" });
        assert_eq!(
            extract_server_message(&body).as_deref(),
            Some("El documento ya existe")
        );
    }

    #[test]
    fn server_message_array_is_joined() {
        let body = serde_json::json!({
            "message": ["nombre is required", "telefono must be numeric"]
        });
        assert_eq!(
            extract_server_message(&body).as_deref(),
            Some("nombre is required, telefono must be numeric")
        );
    }

    #[test]
    fn server_message_object_is_stringified() {
        let body = serde_json::json!({ "message": { "campo": "telefono" } });
        let msg = extract_server_message(&body).expect("object message");
        assert!(msg.contains("telefono"));
    }

    #[test]
    fn server_message_falls_back_to_error_key() {
        let body = serde_json::json!({ "error": "Unauthorized" });
        assert_eq!(extract_server_message(&body).as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn blank_and_missing_messages_are_none() {
        assert_eq!(extract_server_message(&serde_json::json!({})), None);
        assert_eq!(
            extract_server_message(&serde_json::json!({ "message": "  " })),
            None
        );
    }

    #[test]
    fn not_found_predicate() {
        let err = ApiError::Status {
            code: 404,
            message: "Resource not found".into(),
        };
        assert!(err.is_not_found());
        let err = ApiError::Status {
            code: 500,
            message: "boom".into(),
        };
        assert!(!err.is_not_found());
    }
}
