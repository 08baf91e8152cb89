//! IPC command handlers, grouped per entity.
//!
//! Commands are the UI's typed intents. The shared plumbing here implements
//! the orchestration every list screen needs: payload parsing, debounced
//! search, stale-response discarding, page clamping after the total is
//! known, and the post-mutation refresh (with step-back when a delete
//! strands the view on an empty page).

use serde_json::Value;

use crate::gateway::{self, Gateway, ListQuery};
use crate::pager::{self, NotificationKind, PagerRegistry};
use crate::session::SessionState;
use crate::{value_str, value_u64};

pub mod auth;
pub mod banners;
pub mod clients;
pub mod company;
pub mod credits;
pub mod inventory;
pub mod lookups;
pub mod settings;

// ---------------------------------------------------------------------------
// Shared list orchestration
// ---------------------------------------------------------------------------

/// What a list screen may send: any subset of page / size / search / filter.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ListRequest {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub search: Option<String>,
    pub filter: Option<String>,
}

pub(crate) fn parse_list_request(arg0: Option<Value>) -> ListRequest {
    let payload = arg0.unwrap_or(Value::Null);
    ListRequest {
        page: value_u64(&payload, &["page"]),
        size: value_u64(&payload, &["limit", "size", "pageSize"]),
        // An explicit empty string clears the search box, so empties are
        // kept here (unlike `value_str`).
        search: str_allow_empty(&payload, &["search", "q", "term"]),
        filter: value_str(&payload, &["filter", "estado", "status"]),
    }
}

fn str_allow_empty(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(Value::as_str) {
            return Some(s.trim().to_string());
        }
    }
    None
}

/// Marker returned when a response lost the race against a newer request.
/// The frontend drops it instead of rendering.
fn stale() -> Value {
    serde_json::json!({ "stale": true })
}

fn page_json(view: &str, page: &gateway::Page, current_page: u64, size: u64) -> Value {
    serde_json::json!({
        "view": view,
        "items": page.items,
        "total": page.total,
        "page": current_page,
        "size": size,
    })
}

/// Apply a `ListRequest` to the view, fetch the page, and return the
/// normalised result. Handles search debouncing, sequence-number staleness,
/// cancellation on view teardown, and page clamping against the reported
/// total.
pub(crate) async fn refresh_view(
    view: &str,
    resource: &str,
    filter_param: &str,
    req: ListRequest,
    session: &SessionState,
    pagers: &PagerRegistry,
) -> Result<Value, String> {
    // Fold the request into the view state and issue a sequence number.
    let (seq, debounce, lifetime, query) = pagers.with_view(view, |v| {
        let mut debounce = None;
        if let Some(ref term) = req.search {
            if term.trim() != v.search {
                debounce = Some(v.set_search(term));
            }
        }
        // "all"/"todos" clears the filter; an absent filter means no change.
        if let Some(ref f) = req.filter {
            let next = if matches!(f.as_str(), "all" | "todos") {
                None
            } else {
                Some(f.clone())
            };
            if next != v.filter {
                v.set_filter(next);
            }
        }
        if req.page.is_some() || req.size.is_some() {
            v.set_page(req.page.unwrap_or(v.page), req.size.unwrap_or(v.size));
        }
        let seq = v.issue_fetch();
        let query = snapshot_query(v, filter_param);
        (seq, debounce, v.lifetime_token(), query)
    });
    let query = query?;

    // A changed search term waits out the debounce window first; a newer
    // keystroke supersedes this request entirely.
    if let Some(token) = debounce {
        if !pager::debounce_elapsed(&token).await {
            return Ok(stale());
        }
    }

    let gw = Gateway::from_session(session);
    let fetched = tokio::select! {
        _ = lifetime.cancelled() => return Ok(stale()),
        res = gw.list(resource, &query) => res.map_err(|e| e.to_string())?,
    };

    // Discard if a newer fetch was issued while this one was in flight.
    if !pagers.with_view(view, |v| v.is_current(seq)) {
        return Ok(stale());
    }

    // The total may prove the requested page out of range (e.g. data shrank
    // under us). Clamp and refetch once.
    let corrected = pagers.with_view(view, |v| v.revalidate_page(fetched.total));
    let (page_data, current_page) = match corrected {
        None => (fetched, query.page),
        Some(new_page) => {
            let mut requery = query.clone();
            requery.page = new_page;
            let refetched = tokio::select! {
                _ = lifetime.cancelled() => return Ok(stale()),
                res = gw.list(resource, &requery) => res.map_err(|e| e.to_string())?,
            };
            if !pagers.with_view(view, |v| v.is_current(seq)) {
                return Ok(stale());
            }
            (refetched, new_page)
        }
    };

    Ok(page_json(view, &page_data, current_page, query.size))
}

fn snapshot_query(v: &pager::ViewState, filter_param: &str) -> Result<ListQuery, String> {
    let mut query = ListQuery::new(
        v.page,
        v.size,
        Some(v.search.clone()).filter(|s| !s.is_empty()),
    )
    .map_err(|e| e.to_string())?;
    if let Some(ref f) = v.filter {
        query = query.with_param(filter_param, f);
    }
    Ok(query)
}

/// Post-mutation wrap-up: raise the notification and re-run the current
/// page (stepping back if the mutation emptied it). The refreshed page
/// rides along in the response so the screen repaints in one round trip.
pub(crate) async fn after_mutation(
    view: &str,
    resource: &str,
    filter_param: &str,
    kind: NotificationKind,
    message: &str,
    session: &SessionState,
    pagers: &PagerRegistry,
) -> Result<Value, String> {
    let notification = pagers.with_view(view, |v| v.notify(kind, message));
    let refreshed = refresh_view(
        view,
        resource,
        filter_param,
        ListRequest::default(),
        session,
        pagers,
    )
    .await?;
    Ok(serde_json::json!({
        "notification": notification,
        "list": refreshed,
    }))
}

// ---------------------------------------------------------------------------
// View lifecycle / notification commands
// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn view_notification_current(
    arg0: Option<Value>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let view = required_view(arg0)?;
    let current = pagers.with_view(&view, |v| v.current_notification());
    Ok(serde_json::to_value(current).unwrap_or(Value::Null))
}

#[tauri::command]
pub async fn view_notification_dismiss(
    arg0: Option<Value>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let view = required_view(arg0)?;
    pagers.with_view(&view, |v| v.dismiss_notification());
    Ok(serde_json::json!({ "success": true }))
}

/// Called when a list screen unmounts; cancels its in-flight fetches.
#[tauri::command]
pub async fn view_teardown(
    arg0: Option<Value>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let view = required_view(arg0)?;
    pagers.teardown(&view);
    Ok(serde_json::json!({ "success": true }))
}

/// The view's form phase and last submit error, for screens that restore
/// their modal after a reload.
#[tauri::command]
pub async fn view_form_state(
    arg0: Option<Value>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let view = required_view(arg0)?;
    pagers.with_view(&view, |v| {
        Ok(serde_json::json!({
            "phase": v.form.phase(),
            "error": v.form.error(),
        }))
    })
}

/// Abandon the view's current form draft. Ignored while a submit is in
/// flight.
#[tauri::command]
pub async fn view_form_cancel(
    arg0: Option<Value>,
    pagers: tauri::State<'_, PagerRegistry>,
) -> Result<Value, String> {
    let view = required_view(arg0)?;
    pagers.with_view(&view, |v| v.form.cancel());
    Ok(serde_json::json!({ "success": true }))
}

fn required_view(arg0: Option<Value>) -> Result<String, String> {
    match arg0 {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(ref v) => value_str(v, &["view"]).ok_or_else(|| "Missing view name".to_string()),
        None => Err("Missing view name".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_request_reads_aliases() {
        let req = parse_list_request(Some(serde_json::json!({
            "page": 2,
            "pageSize": 25,
            "q": "garcia",
            "estado": "activo"
        })));
        assert_eq!(req.page, Some(2));
        assert_eq!(req.size, Some(25));
        assert_eq!(req.search.as_deref(), Some("garcia"));
        assert_eq!(req.filter.as_deref(), Some("activo"));
    }

    #[test]
    fn parse_list_request_tolerates_empty_payload() {
        assert_eq!(parse_list_request(None), ListRequest::default());
    }

    #[test]
    fn required_view_accepts_string_and_object() {
        assert_eq!(
            required_view(Some(serde_json::json!("clients"))).expect("plain string"),
            "clients"
        );
        assert_eq!(
            required_view(Some(serde_json::json!({ "view": "credits" }))).expect("object"),
            "credits"
        );
        assert!(required_view(None).is_err());
    }
}
