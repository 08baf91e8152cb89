//! Client (cliente) management commands.
//!
//! CRUD against `/clientes` plus a best-effort duplicate-document pre-check
//! before creation. The pre-check is advisory only; the backend remains
//! authoritative and its rejection message is surfaced verbatim.

use serde_json::Value;

use crate::forms;
use crate::gateway::{Gateway, ListQuery, RES_CLIENTS};
use crate::pager::{NotificationKind, PagerRegistry};
use crate::session::SessionState;
use crate::value_str;

use super::{after_mutation, parse_list_request, refresh_view};

const VIEW: &str = "clients";
const FILTER_PARAM: &str = "estado";

fn validate_client_payload(payload: &Value) -> Result<Value, String> {
    let name = forms::require_str(payload, &["nombre", "name"], "Name")?;
    let document_type =
        forms::require_str(payload, &["tipo_documento", "tipoDocumento"], "Document type")?;
    let document_number = forms::require_str(
        payload,
        &["numero_documento", "numeroDocumento"],
        "Document number",
    )?;

    let mut normalized = serde_json::json!({
        "nombre": name,
        "tipo_documento": document_type,
        "numero_documento": document_number,
    });
    // Optional contact fields pass through when present.
    if let Some(obj) = normalized.as_object_mut() {
        for key in ["telefono", "email", "direccion"] {
            if let Some(v) = value_str(payload, &[key]) {
                obj.insert(key.to_string(), Value::String(v));
            }
        }
    }
    Ok(normalized)
}

/// Best-effort duplicate check: search the document number and look for an
/// exact match. A failed lookup does not block creation; the backend will
/// catch real duplicates.
async fn document_already_registered(gw: &Gateway, document_number: &str) -> bool {
    let query = match ListQuery::new(1, 5, Some(document_number.to_string())) {
        Ok(q) => q,
        Err(_) => return false,
    };
    match gw.list(RES_CLIENTS, &query).await {
        Ok(page) => page.items.iter().any(|item| {
            value_str(item, &["numero_documento", "numeroDocumento"]).as_deref()
                == Some(document_number)
        }),
        Err(_) => false,
    }
}

#[tauri::command]
pub async fn clients_list(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let req = parse_list_request(arg0);
    refresh_view(VIEW, RES_CLIENTS, FILTER_PARAM, req, &session, &pagers).await
}

#[tauri::command]
pub async fn client_create(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing client payload")?;
    pagers.with_view(VIEW, |v| {
        v.form.begin_edit();
        v.form.begin_submit()
    })?;

    let normalized = match validate_client_payload(&payload) {
        Ok(n) => n,
        Err(msg) => {
            pagers.with_view(VIEW, |v| v.form.submit_failed(msg.as_str()));
            return Err(msg);
        }
    };

    let gw = Gateway::from_session(&session);
    let document_number = normalized["numero_documento"].as_str().unwrap_or_default();
    if document_already_registered(&gw, document_number).await {
        let msg = format!("A client with document {document_number} already exists");
        pagers.with_view(VIEW, |v| v.form.submit_failed(msg.as_str()));
        return Err(msg);
    }

    match gw.create(RES_CLIENTS, &normalized).await {
        Ok(created) => {
            pagers.with_view(VIEW, |v| v.form.submit_succeeded());
            let wrap = after_mutation(
                VIEW,
                RES_CLIENTS,
                FILTER_PARAM,
                NotificationKind::Success,
                "Client created",
                &session,
                &pagers,
            )
            .await?;
            Ok(serde_json::json!({ "data": created, "refresh": wrap }))
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(VIEW, |v| {
                v.form.submit_failed(msg.as_str());
                v.notify(NotificationKind::Error, msg.as_str());
            });
            Err(msg)
        }
    }
}

#[tauri::command]
pub async fn client_update(
    arg0: Option<Value>,
    arg1: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let id = crate::payload_id(arg0, &["id", "clienteId", "cliente_id"])
        .ok_or("Missing client id")?;
    let updates = arg1.ok_or("Missing client updates")?;
    if !updates.is_object() {
        return Err("updates must be an object".into());
    }

    let gw = Gateway::from_session(&session);
    match gw.update(RES_CLIENTS, &id, &updates).await {
        Ok(updated) => {
            let wrap = after_mutation(
                VIEW,
                RES_CLIENTS,
                FILTER_PARAM,
                NotificationKind::Success,
                "Client updated",
                &session,
                &pagers,
            )
            .await?;
            Ok(serde_json::json!({ "data": updated, "refresh": wrap }))
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(VIEW, |v| v.notify(NotificationKind::Error, msg.as_str()));
            Err(msg)
        }
    }
}

#[tauri::command]
pub async fn client_delete(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let id = crate::payload_id(arg0, &["id", "clienteId", "cliente_id"])
        .ok_or("Missing client id")?;

    let gw = Gateway::from_session(&session);
    match gw.delete(RES_CLIENTS, &id).await {
        Ok(_) => {
            after_mutation(
                VIEW,
                RES_CLIENTS,
                FILTER_PARAM,
                NotificationKind::Success,
                "Client deleted",
                &session,
                &pagers,
            )
            .await
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(VIEW, |v| v.notify(NotificationKind::Error, msg.as_str()));
            Err(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_requires_name_and_document() {
        let missing = serde_json::json!({ "telefono": "3001234567" });
        assert!(validate_client_payload(&missing).is_err());

        let ok = serde_json::json!({
            "nombre": "  Comercial Andina  ",
            "tipo_documento": "NIT",
            "numero_documento": "900123456",
            "email": "ventas@andina.co"
        });
        let normalized = validate_client_payload(&ok).expect("complete payload");
        assert_eq!(
            normalized.get("nombre").and_then(Value::as_str),
            Some("Comercial Andina")
        );
        assert_eq!(
            normalized.get("email").and_then(Value::as_str),
            Some("ventas@andina.co")
        );
        // Unknown keys are not forwarded.
        assert!(normalized.get("id").is_none());
    }

    #[test]
    fn camel_case_aliases_accepted() {
        let payload = serde_json::json!({
            "nombre": "Cliente",
            "tipoDocumento": "CC",
            "numeroDocumento": "1012345678"
        });
        let normalized = validate_client_payload(&payload).expect("camelCase payload");
        assert_eq!(
            normalized.get("numero_documento").and_then(Value::as_str),
            Some("1012345678")
        );
    }
}
