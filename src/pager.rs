//! Page orchestration state.
//!
//! One `ViewState` per admin list screen (clients, credits, inventory,
//! lookups): current page, page size, search term, active filter, the
//! transient notification, and the bookkeeping that keeps concurrent
//! fetches honest:
//!
//! - every fetch is issued a monotonically increasing sequence number;
//!   a response is applied only when its sequence is still the latest,
//!   so a slow response for a stale query can never overwrite a newer one
//! - in-flight work is tied to the view's `CancellationToken` and dies
//!   with the view
//! - search keystrokes are debounced 300 ms before a fetch is issued
//!
//! Mutations re-validate the page afterwards: deleting the last item of a
//! non-first page steps the view back instead of stranding it on an empty
//! page.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::forms::FormController;
use crate::gateway;

/// Quiet period after the last keystroke before a search fetch fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Notifications auto-dismiss after this long; manual dismiss is always
/// available.
pub const NOTIFICATION_TTL_SECS: i64 = 4;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// The single transient banner a view shows. A new notification replaces
/// any prior one.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
            kind,
            raised_at: Utc::now(),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() - self.raised_at > ChronoDuration::seconds(NOTIFICATION_TTL_SECS)
    }
}

// ---------------------------------------------------------------------------
// Per-view state
// ---------------------------------------------------------------------------

pub struct ViewState {
    pub page: u64,
    pub size: u64,
    pub search: String,
    pub filter: Option<String>,
    /// The view's create/edit form (modal). One submit at a time.
    pub form: FormController,
    latest_seq: u64,
    notification: Option<Notification>,
    debounce: Option<CancellationToken>,
    lifetime: CancellationToken,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            filter: None,
            form: FormController::default(),
            latest_seq: 0,
            notification: None,
            debounce: None,
            lifetime: CancellationToken::new(),
        }
    }

    /// Issue a sequence number for a fetch about to start. The newest
    /// issued number is the only one whose response will be applied.
    pub fn issue_fetch(&mut self) -> u64 {
        self.latest_seq += 1;
        self.latest_seq
    }

    /// Whether a response carrying `seq` is still current.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest_seq
    }

    /// Token in-flight work for this view should select on.
    pub fn lifetime_token(&self) -> CancellationToken {
        self.lifetime.child_token()
    }

    /// Change the search term. Resets to page 1 and returns a fresh
    /// debounce token; any previous pending debounce is cancelled.
    pub fn set_search(&mut self, term: &str) -> CancellationToken {
        self.search = term.trim().to_string();
        self.page = 1;
        if let Some(prev) = self.debounce.take() {
            prev.cancel();
        }
        let token = self.lifetime.child_token();
        self.debounce = Some(token.clone());
        token
    }

    pub fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter.filter(|f| !f.trim().is_empty());
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u64, size: u64) {
        self.page = page.max(1);
        self.size = size.max(1);
    }

    /// Re-validate the page after a mutation, given the freshly reported
    /// total. Returns the corrected page when the current one no longer
    /// exists (e.g. the last item of the last page was deleted).
    pub fn revalidate_page(&mut self, total: u64) -> Option<u64> {
        let clamped = gateway::clamp_page(self.page, total, self.size);
        if clamped != self.page {
            self.page = clamped;
            Some(clamped)
        } else {
            None
        }
    }

    /// Raise a notification, replacing any prior one.
    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) -> Notification {
        let n = Notification::new(kind, message);
        self.notification = Some(n.clone());
        n
    }

    /// The visible notification, if it has neither expired nor been
    /// dismissed.
    pub fn current_notification(&mut self) -> Option<Notification> {
        if self.notification.as_ref().is_some_and(Notification::is_expired) {
            self.notification = None;
        }
        self.notification.clone()
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait out the debounce window. Returns `false` when a newer keystroke
/// superseded this one (or the view went away) before the window elapsed.
pub async fn debounce_elapsed(token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(SEARCH_DEBOUNCE) => true,
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Tauri managed state: one `ViewState` per named list screen.
#[derive(Default)]
pub struct PagerRegistry {
    views: Mutex<HashMap<String, ViewState>>,
}

impl PagerRegistry {
    pub fn with_view<R>(&self, view: &str, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut views = self.views.lock().unwrap();
        let state = views.entry(view.to_string()).or_default();
        f(state)
    }

    /// Drop a view's state and cancel anything still in flight for it.
    pub fn teardown(&self, view: &str) {
        let mut views = self.views.lock().unwrap();
        if let Some(state) = views.remove(view) {
            state.lifetime.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_response_is_discarded() {
        let mut view = ViewState::new();
        let first = view.issue_fetch();
        let second = view.issue_fetch();
        assert!(!view.is_current(first));
        assert!(view.is_current(second));
    }

    #[test]
    fn search_resets_to_first_page() {
        let mut view = ViewState::new();
        view.set_page(4, 10);
        let _ = view.set_search("garcia");
        assert_eq!(view.page, 1);
        assert_eq!(view.search, "garcia");
    }

    #[test]
    fn new_search_cancels_pending_debounce() {
        let mut view = ViewState::new();
        let first = view.set_search("gar");
        let _second = view.set_search("garc");
        assert!(first.is_cancelled());
    }

    #[test]
    fn deleting_last_item_of_last_page_steps_back() {
        let mut view = ViewState::new();
        view.set_page(3, 10);
        // 21 items before the delete, 20 after: page 3 no longer exists.
        assert_eq!(view.revalidate_page(20), Some(2));
        assert_eq!(view.page, 2);
        // Deleting from a still-populated page changes nothing.
        assert_eq!(view.revalidate_page(15), None);
    }

    #[test]
    fn empty_result_set_lands_on_page_one() {
        let mut view = ViewState::new();
        view.set_page(2, 10);
        assert_eq!(view.revalidate_page(0), Some(1));
    }

    #[test]
    fn notification_replaces_prior() {
        let mut view = ViewState::new();
        let first = view.notify(NotificationKind::Success, "Cliente creado");
        let second = view.notify(NotificationKind::Error, "No se pudo eliminar");
        assert_ne!(first.id, second.id);
        let current = view.current_notification().expect("notification visible");
        assert_eq!(current.id, second.id);
        assert_eq!(current.kind, NotificationKind::Error);
    }

    #[test]
    fn notification_expires_after_ttl() {
        let mut view = ViewState::new();
        view.notify(NotificationKind::Success, "Guardado");
        // Backdate past the TTL.
        if let Some(n) = view.notification.as_mut() {
            n.raised_at = Utc::now() - ChronoDuration::seconds(NOTIFICATION_TTL_SECS + 1);
        }
        assert!(view.current_notification().is_none());
    }

    #[test]
    fn manual_dismiss() {
        let mut view = ViewState::new();
        view.notify(NotificationKind::Success, "Guardado");
        view.dismiss_notification();
        assert!(view.current_notification().is_none());
    }

    #[tokio::test]
    async fn superseded_debounce_reports_false() {
        let mut view = ViewState::new();
        let token = view.set_search("g");
        token.cancel();
        assert!(!debounce_elapsed(&token).await);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_debounce_elapses() {
        let mut view = ViewState::new();
        let token = view.set_search("garcia");
        assert!(debounce_elapsed(&token).await);
    }

    #[test]
    fn teardown_cancels_lifetime() {
        let registry = PagerRegistry::default();
        let token = registry.with_view("clients", |v| v.lifetime_token());
        registry.teardown("clients");
        assert!(token.is_cancelled());
    }
}
