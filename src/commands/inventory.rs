//! Inventory audit (ajuste de inventario) commands.
//!
//! An adjustment records the system stock at entry time and the physical
//! count the auditor typed in. The difference shown in the table is always
//! recomputed from those two fields; an unset physical count displays as no
//! discrepancy. Adjustments are never edited: a wrong one is deleted
//! (voided server-side) and re-entered.

use serde_json::Value;

use crate::forms;
use crate::gateway::{Gateway, RES_INVENTORY_ADJUSTMENTS};
use crate::ledger;
use crate::pager::{NotificationKind, PagerRegistry};
use crate::session::SessionState;
use crate::{payload_id, value_str};

use super::{after_mutation, parse_list_request, refresh_view};

const VIEW: &str = "inventory";
const FILTER_PARAM: &str = "estado";

/// Recent adjustments live under a dedicated path.
const RECENT_PATH: &str = "/ajustes-inventario/recientes";

fn validate_adjustment_payload(payload: &Value) -> Result<Value, String> {
    let product_id = forms::require_str(payload, &["producto_id", "productoId"], "Product")?;
    let system_stock =
        forms::require_number(payload, &["stock_sistema", "stockSistema"], "System stock")?;
    let physical_stock =
        forms::optional_number(payload, &["stock_fisico", "stockFisico"], "Physical stock")?;

    let delta = ledger::inventory_delta(system_stock, physical_stock);

    let mut normalized = serde_json::json!({
        "producto_id": product_id,
        "stock_sistema": system_stock,
        "stock_fisico": physical_stock,
        "diferencia": delta,
    });
    if let Some(obj) = normalized.as_object_mut() {
        if let Some(notes) = value_str(payload, &["observaciones", "notes"]) {
            obj.insert("observaciones".to_string(), Value::String(notes));
        }
    }
    Ok(normalized)
}

#[tauri::command]
pub async fn inventory_adjustments_recent(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let req = parse_list_request(arg0);
    refresh_view(VIEW, RECENT_PATH, FILTER_PARAM, req, &session, &pagers).await
}

#[tauri::command]
pub async fn inventory_adjustment_create(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing adjustment payload")?;
    let normalized = validate_adjustment_payload(&payload)?;

    let gw = Gateway::from_session(&session);
    match gw.create(RES_INVENTORY_ADJUSTMENTS, &normalized).await {
        Ok(created) => {
            let wrap = after_mutation(
                VIEW,
                RECENT_PATH,
                FILTER_PARAM,
                NotificationKind::Success,
                "Adjustment recorded",
                &session,
                &pagers,
            )
            .await?;
            Ok(serde_json::json!({ "data": created, "refresh": wrap }))
        }
        Err(e) => {
            let msg = e.to_string();
            pagers.with_view(VIEW, |v| v.notify(NotificationKind::Error, msg.as_str()));
            Err(msg)
        }
    }
}

#[tauri::command]
pub async fn inventory_adjustment_delete(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let id =
        payload_id(arg0, &["id", "ajusteId", "ajuste_id"]).ok_or("Missing adjustment id")?;

    let gw = Gateway::from_session(&session);
    match gw.delete(RES_INVENTORY_ADJUSTMENTS, &id).await {
        Ok(_) => {
            after_mutation(
                VIEW,
                RECENT_PATH,
                FILTER_PARAM,
                NotificationKind::Success,
                "Adjustment deleted",
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

/// Pure helper for the audit screen: the delta to display for one row as
/// the auditor types, before anything is persisted.
#[tauri::command]
pub async fn inventory_delta_preview(arg0: Option<Value>) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing stock values")?;
    let system_stock =
        forms::require_number(&payload, &["stock_sistema", "stockSistema"], "System stock")?;
    let physical_stock =
        forms::optional_number(&payload, &["stock_fisico", "stockFisico"], "Physical stock")?;
    Ok(serde_json::json!({
        "diferencia": ledger::inventory_delta(system_stock, physical_stock),
        "pendiente": physical_stock.is_none(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustment_delta_is_computed_not_trusted() {
        // A client-supplied diferencia is ignored; the computed one wins.
        let payload = serde_json::json!({
            "producto_id": "prod-9",
            "stock_sistema": 50,
            "stock_fisico": 47,
            "diferencia": 999
        });
        let normalized = validate_adjustment_payload(&payload).expect("valid adjustment");
        assert_eq!(
            normalized.get("diferencia").and_then(Value::as_f64),
            Some(-3.0)
        );
    }

    #[test]
    fn unset_physical_count_yields_zero_delta() {
        let payload = serde_json::json!({
            "producto_id": "prod-9",
            "stock_sistema": 50,
            "stock_fisico": null
        });
        let normalized = validate_adjustment_payload(&payload).expect("valid adjustment");
        assert_eq!(
            normalized.get("diferencia").and_then(Value::as_f64),
            Some(0.0)
        );
        assert!(normalized.get("stock_fisico").unwrap().is_null());
    }

    #[test]
    fn product_and_system_stock_required() {
        let payload = serde_json::json!({ "stock_fisico": 10 });
        assert!(validate_adjustment_payload(&payload).is_err());
    }
}
