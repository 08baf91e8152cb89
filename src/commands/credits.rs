//! Credit and credit-payment commands.
//!
//! A credit is a ledger entry whose reference value is the principal
//! (`valor_credito`); payments against it are applications that reduce the
//! outstanding balance. The balance is never stored client-side: every
//! screen repaint recomputes it from the live payment list. Voiding a
//! payment is a status flip on the backend; a double void is rejected there
//! and the rejection is forwarded as-is.

use serde_json::Value;

use crate::forms;
use crate::gateway::{Gateway, RES_CREDITS, RES_CREDIT_PAYMENTS};
use crate::ledger;
use crate::pager::{NotificationKind, PagerRegistry};
use crate::session::SessionState;
use crate::{payload_id, value_str};

use super::{after_mutation, parse_list_request, refresh_view};

const VIEW: &str = "credits";
const FILTER_PARAM: &str = "estado";

fn validate_credit_payload(payload: &Value) -> Result<Value, String> {
    let client_id = forms::require_str(payload, &["cliente_id", "clienteId"], "Client")?;
    let principal =
        forms::require_positive_number(payload, &["valor_credito", "valorCredito"], "Credit amount")?;

    let mut normalized = serde_json::json!({
        "cliente_id": client_id,
        "valor_credito": principal,
    });
    if let Some(obj) = normalized.as_object_mut() {
        if let Some(notes) = value_str(payload, &["observaciones", "notes"]) {
            obj.insert("observaciones".to_string(), Value::String(notes));
        }
    }
    Ok(normalized)
}

fn validate_payment_payload(payload: &Value) -> Result<Value, String> {
    let credit_id = forms::require_str(payload, &["credito_id", "creditoId"], "Credit")?;
    let amount =
        forms::require_positive_number(payload, &["monto_pago", "montoPago"], "Payment amount")?;

    let mut normalized = serde_json::json!({
        "credito_id": credit_id,
        "monto_pago": amount,
    });
    if let Some(obj) = normalized.as_object_mut() {
        if let Some(notes) = value_str(payload, &["observaciones", "notes"]) {
            obj.insert("observaciones".to_string(), Value::String(notes));
        }
    }
    Ok(normalized)
}

#[tauri::command]
pub async fn credits_list(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let req = parse_list_request(arg0);
    refresh_view(VIEW, RES_CREDITS, FILTER_PARAM, req, &session, &pagers).await
}

#[tauri::command]
pub async fn credit_create(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing credit payload")?;
    pagers.with_view(VIEW, |v| {
        v.form.begin_edit();
        v.form.begin_submit()
    })?;
    let normalized = match validate_credit_payload(&payload) {
        Ok(n) => n,
        Err(msg) => {
            pagers.with_view(VIEW, |v| v.form.submit_failed(msg.as_str()));
            return Err(msg);
        }
    };

    let gw = Gateway::from_session(&session);
    match gw.create(RES_CREDITS, &normalized).await {
        Ok(created) => {
            pagers.with_view(VIEW, |v| v.form.submit_succeeded());
            let wrap = after_mutation(
                VIEW,
                RES_CREDITS,
                FILTER_PARAM,
                NotificationKind::Success,
                "Credit created",
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
pub async fn credit_update(
    arg0: Option<Value>,
    arg1: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let id = payload_id(arg0, &["id", "creditoId", "credito_id"]).ok_or("Missing credit id")?;
    let updates = arg1.ok_or("Missing credit updates")?;
    if !updates.is_object() {
        return Err("updates must be an object".into());
    }

    let gw = Gateway::from_session(&session);
    match gw.update(RES_CREDITS, &id, &updates).await {
        Ok(updated) => {
            let wrap = after_mutation(
                VIEW,
                RES_CREDITS,
                FILTER_PARAM,
                NotificationKind::Success,
                "Credit updated",
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
pub async fn credit_delete(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let id = payload_id(arg0, &["id", "creditoId", "credito_id"]).ok_or("Missing credit id")?;

    let gw = Gateway::from_session(&session);
    match gw.delete(RES_CREDITS, &id).await {
        Ok(_) => {
            after_mutation(
                VIEW,
                RES_CREDITS,
                FILTER_PARAM,
                NotificationKind::Success,
                "Credit deleted",
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

/// Apply a payment: `POST /pagos-credito {credito_id, monto_pago}`. The
/// backend answers `{mensaje, nuevo_saldo, estado}`; the reported balance is
/// shown immediately while the next `credit_balance` call recomputes it
/// from the payment list.
#[tauri::command]
pub async fn credit_apply_payment(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing payment payload")?;
    let normalized = validate_payment_payload(&payload)?;

    let gw = Gateway::from_session(&session);
    match gw.post(RES_CREDIT_PAYMENTS, &normalized).await {
        Ok(result) => {
            let message = value_str(&result, &["mensaje", "message"])
                .unwrap_or_else(|| "Payment applied".to_string());
            pagers.with_view(VIEW, |v| v.notify(NotificationKind::Success, message.as_str()));
            Ok(result)
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(VIEW, |v| v.notify(NotificationKind::Error, msg.as_str()));
            Err(msg)
        }
    }
}

/// Payments of one credit plus the freshly computed balance projection.
///
/// Payload: `{creditoId, valorCredito}` — the principal comes from the
/// already-loaded credit row, the payment list from
/// `GET /pagos-credito/credito/:id`.
#[tauri::command]
pub async fn credit_balance(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing credit reference")?;
    let credit_id = forms::require_str(&payload, &["credito_id", "creditoId", "id"], "Credit")?;
    let principal =
        forms::require_number(&payload, &["valor_credito", "valorCredito"], "Credit amount")?;
    if principal < 0.0 {
        return Err("Credit amount must not be negative".into());
    }

    let gw = Gateway::from_session(&session);
    let path = format!("{RES_CREDIT_PAYMENTS}/credito/{credit_id}");
    let page = gw.list_all(&path).await.map_err(|e| e.to_string())?;

    let payments = ledger::parse_payments(&page.items);
    let projection = ledger::balance_projection(principal, &payments);

    Ok(serde_json::json!({
        "credito_id": credit_id,
        "valor_credito": principal,
        "pagos": payments,
        "saldo_pendiente": projection.outstanding,
        "sobrepago": projection.overpaid,
    }))
}

/// Void a payment. Logical deletion server-side: the row survives with
/// `estado = VOIDED` and the next balance projection reflects it.
#[tauri::command]
pub async fn credit_void_payment(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let id = payload_id(arg0, &["id", "pagoId", "pago_id"]).ok_or("Missing payment id")?;

    let gw = Gateway::from_session(&session);
    match gw.delete(RES_CREDIT_PAYMENTS, &id).await {
        Ok(result) => {
            pagers.with_view(VIEW, |v| v.notify(NotificationKind::Success, "Payment voided"));
            Ok(if result.is_null() {
                serde_json::json!({ "success": true })
            } else {
                result
            })
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(VIEW, |v| v.notify(NotificationKind::Error, msg.as_str()));
            Err(msg)
        }
    }
}
