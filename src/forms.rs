//! Form controller state machine.
//!
//! Every editable entity form moves through Idle -> Editing -> Submitting
//! and back: Idle on success, Editing (annotated with the server's message)
//! on failure. A submit while another submit is in flight is rejected, so
//! double-clicks cannot fire two create requests. Client-side checks are a
//! pre-flight convenience only; the backend stays authoritative and its
//! validation messages are surfaced verbatim.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Idle,
    Editing,
    Submitting,
}

/// Per-form state. One controller per open form/modal.
#[derive(Debug)]
pub struct FormController {
    phase: FormPhase,
    error: Option<String>,
}

impl Default for FormController {
    fn default() -> Self {
        Self {
            phase: FormPhase::Idle,
            error: None,
        }
    }
}

impl FormController {
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// The last submit failure, exactly as the server worded it.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The local draft diverged from the persisted value.
    pub fn begin_edit(&mut self) {
        if self.phase == FormPhase::Idle {
            self.phase = FormPhase::Editing;
        }
    }

    /// Start a submit. Fails when one is already in flight.
    pub fn begin_submit(&mut self) -> Result<(), String> {
        if self.phase == FormPhase::Submitting {
            return Err("A submit is already in progress".into());
        }
        self.phase = FormPhase::Submitting;
        self.error = None;
        Ok(())
    }

    pub fn submit_succeeded(&mut self) {
        self.phase = FormPhase::Idle;
        self.error = None;
    }

    /// Back to Editing with the failure annotated, so the user can correct
    /// the draft and retry.
    pub fn submit_failed(&mut self, message: impl Into<String>) {
        self.phase = FormPhase::Editing;
        self.error = Some(message.into());
    }

    /// Abandon the draft.
    pub fn cancel(&mut self) {
        if self.phase != FormPhase::Submitting {
            self.phase = FormPhase::Idle;
            self.error = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Pre-flight field checks
// ---------------------------------------------------------------------------

/// Require a non-empty string field, trying each key in order.
pub fn require_str(payload: &Value, keys: &[&str], label: &str) -> Result<String, String> {
    for key in keys {
        if let Some(s) = payload.get(*key).and_then(Value::as_str) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
    }
    Err(format!("{label} is required"))
}

/// Require a numeric field. String-typed numbers (as text inputs produce)
/// are parsed.
pub fn require_number(payload: &Value, keys: &[&str], label: &str) -> Result<f64, String> {
    for key in keys {
        match payload.get(*key) {
            Some(Value::Number(n)) => {
                if let Some(f) = n.as_f64() {
                    return Ok(f);
                }
            }
            Some(Value::String(s)) => {
                if let Ok(f) = s.trim().parse::<f64>() {
                    return Ok(f);
                }
                return Err(format!("{label} must be a number"));
            }
            _ => continue,
        }
    }
    Err(format!("{label} is required"))
}

/// Require a strictly positive amount.
pub fn require_positive_number(payload: &Value, keys: &[&str], label: &str) -> Result<f64, String> {
    let n = require_number(payload, keys, label)?;
    if n <= 0.0 {
        return Err(format!("{label} must be greater than zero"));
    }
    Ok(n)
}

/// Optional numeric field: absent or null stays `None`, anything present
/// must parse.
pub fn optional_number(payload: &Value, keys: &[&str], label: &str) -> Result<Option<f64>, String> {
    for key in keys {
        match payload.get(*key) {
            Some(Value::Null) | None => continue,
            Some(Value::Number(n)) => return Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => continue,
            Some(Value::String(s)) => {
                return s
                    .trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| format!("{label} must be a number"));
            }
            Some(_) => return Err(format!("{label} must be a number")),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_success_path() {
        let mut form = FormController::default();
        assert_eq!(form.phase(), FormPhase::Idle);

        form.begin_edit();
        assert_eq!(form.phase(), FormPhase::Editing);

        form.begin_submit().expect("first submit allowed");
        assert_eq!(form.phase(), FormPhase::Submitting);

        form.submit_succeeded();
        assert_eq!(form.phase(), FormPhase::Idle);
        assert!(form.error().is_none());
    }

    #[test]
    fn concurrent_submit_rejected() {
        let mut form = FormController::default();
        form.begin_edit();
        form.begin_submit().expect("first submit allowed");
        assert!(form.begin_submit().is_err());
        assert_eq!(form.phase(), FormPhase::Submitting);
    }

    #[test]
    fn failure_returns_to_editing_with_server_message() {
        let mut form = FormController::default();
        form.begin_edit();
        form.begin_submit().expect("submit allowed");
        form.submit_failed("numero_documento ya registrado");
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.error(), Some("numero_documento ya registrado"));

        // Retry clears the stale annotation.
        form.begin_submit().expect("retry allowed");
        assert!(form.error().is_none());
    }

    #[test]
    fn cancel_ignored_while_submitting() {
        let mut form = FormController::default();
        form.begin_edit();
        form.begin_submit().expect("submit allowed");
        form.cancel();
        assert_eq!(form.phase(), FormPhase::Submitting);
    }

    #[test]
    fn require_str_tries_aliases() {
        let payload = serde_json::json!({ "numero_documento": " 900123456 " });
        let v = require_str(&payload, &["numeroDocumento", "numero_documento"], "Document")
            .expect("alias should match");
        assert_eq!(v, "900123456");
        assert!(require_str(&payload, &["nombre"], "Name").is_err());
    }

    #[test]
    fn require_positive_number_parses_strings() {
        let payload = serde_json::json!({ "monto_pago": "400000" });
        let v = require_positive_number(&payload, &["monto_pago"], "Amount")
            .expect("string number should parse");
        assert_eq!(v, 400000.0);

        let zero = serde_json::json!({ "monto_pago": 0 });
        assert!(require_positive_number(&zero, &["monto_pago"], "Amount").is_err());
    }

    #[test]
    fn optional_number_distinguishes_absent_from_invalid() {
        let absent = serde_json::json!({ "stock_fisico": null });
        assert_eq!(
            optional_number(&absent, &["stock_fisico"], "Physical stock").expect("null is absent"),
            None
        );

        let invalid = serde_json::json!({ "stock_fisico": "abc" });
        assert!(optional_number(&invalid, &["stock_fisico"], "Physical stock").is_err());

        let present = serde_json::json!({ "stock_fisico": 47 });
        assert_eq!(
            optional_number(&present, &["stock_fisico"], "Physical stock").expect("number parses"),
            Some(47.0)
        );
    }
}
