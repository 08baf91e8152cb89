//! Lookup-table commands: document types and payment methods.
//!
//! Both tables share one CRUD shape, so the commands take the table kind as
//! the first argument and validate it against an allowlist.

use serde_json::Value;

use crate::forms;
use crate::gateway::{Gateway, RES_DOCUMENT_TYPES, RES_PAYMENT_METHODS};
use crate::pager::{NotificationKind, PagerRegistry};
use crate::session::SessionState;
use crate::payload_id;

use super::{after_mutation, parse_list_request, refresh_view};

const FILTER_PARAM: &str = "estado";

fn resolve_kind(kind: &str) -> Result<(&'static str, &'static str), String> {
    match kind {
        "tipos-documento" | "document-types" => Ok(("document_types", RES_DOCUMENT_TYPES)),
        "metodos-pago" | "payment-methods" => Ok(("payment_methods", RES_PAYMENT_METHODS)),
        other => Err(format!("Unknown lookup table: {other}")),
    }
}

fn parse_kind(arg0: &Option<Value>) -> Result<(&'static str, &'static str), String> {
    let kind = match arg0 {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(v) => crate::value_str(v, &["kind", "table"]).unwrap_or_default(),
        None => String::new(),
    };
    if kind.is_empty() {
        return Err("Missing lookup table kind".into());
    }
    resolve_kind(&kind)
}

#[tauri::command]
pub async fn lookup_list(
    arg0: Option<Value>,
    arg1: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let (view, resource) = parse_kind(&arg0)?;
    let req = parse_list_request(arg1);
    refresh_view(view, resource, FILTER_PARAM, req, &session, &pagers).await
}

#[tauri::command]
pub async fn lookup_create(
    arg0: Option<Value>,
    arg1: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let (view, resource) = parse_kind(&arg0)?;
    let payload = arg1.ok_or("Missing payload")?;
    let name = forms::require_str(&payload, &["nombre", "name"], "Name")?;
    let normalized = serde_json::json!({ "nombre": name });

    let gw = Gateway::from_session(&session);
    match gw.create(resource, &normalized).await {
        Ok(created) => {
            let wrap = after_mutation(
                view,
                resource,
                FILTER_PARAM,
                NotificationKind::Success,
                "Entry created",
                &session,
                &pagers,
            )
            .await?;
            Ok(serde_json::json!({ "data": created, "refresh": wrap }))
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(view, |v| v.notify(NotificationKind::Error, msg.as_str()));
            Err(msg)
        }
    }
}

#[tauri::command]
pub async fn lookup_update(
    arg0: Option<Value>,
    arg1: Option<Value>,
    arg2: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let (view, resource) = parse_kind(&arg0)?;
    let id = payload_id(arg1, &["id"]).ok_or("Missing entry id")?;
    let updates = arg2.ok_or("Missing updates")?;
    if !updates.is_object() {
        return Err("updates must be an object".into());
    }

    let gw = Gateway::from_session(&session);
    match gw.update(resource, &id, &updates).await {
        Ok(updated) => {
            let wrap = after_mutation(
                view,
                resource,
                FILTER_PARAM,
                NotificationKind::Success,
                "Entry updated",
                &session,
                &pagers,
            )
            .await?;
            Ok(serde_json::json!({ "data": updated, "refresh": wrap }))
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(view, |v| v.notify(NotificationKind::Error, msg.as_str()));
            Err(msg)
        }
    }
}

#[tauri::command]
pub async fn lookup_delete(
    arg0: Option<Value>,
    arg1: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let (view, resource) = parse_kind(&arg0)?;
    let id = payload_id(arg1, &["id"]).ok_or("Missing entry id")?;

    let gw = Gateway::from_session(&session);
    match gw.delete(resource, &id).await {
        Ok(_) => {
            after_mutation(
                view,
                resource,
                FILTER_PARAM,
                NotificationKind::Success,
                "Entry deleted",
                &session,
                &pagers,
            )
            .await
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(view, |v| v.notify(NotificationKind::Error, msg.as_str()));
            Err(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_allowlist() {
        assert!(resolve_kind("tipos-documento").is_ok());
        assert!(resolve_kind("metodos-pago").is_ok());
        assert!(resolve_kind("productos").is_err());
    }

    #[test]
    fn kind_from_string_or_object() {
        assert!(parse_kind(&Some(serde_json::json!("metodos-pago"))).is_ok());
        assert!(parse_kind(&Some(serde_json::json!({ "kind": "tipos-documento" }))).is_ok());
        assert!(parse_kind(&None).is_err());
    }
}
