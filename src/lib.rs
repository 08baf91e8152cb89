//! DISEM Admin - Tauri v2 Backend
//!
//! Registers the IPC command handlers the React admin frontend calls via
//! `@tauri-apps/api/core::invoke()`. All business persistence lives in the
//! external REST backend; this side owns the gateway to it, the ledger
//! reconciliation math, and the list-screen orchestration (paging, search
//! debounce, stale-response discarding, notifications).

use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod commands;
mod config;
mod forms;
mod gateway;
mod ledger;
mod pager;
mod session;
mod storage;

// ---------------------------------------------------------------------------
// Loose-payload helpers
//
// The frontend sends arguments as untyped JSON with a mix of camelCase and
// snake_case keys; these read the first matching key.
// ---------------------------------------------------------------------------

pub(crate) fn value_str(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

pub(crate) fn value_u64(v: &Value, keys: &[&str]) -> Option<u64> {
    for key in keys {
        if let Some(n) = v.get(*key).and_then(|x| x.as_u64()) {
            return Some(n);
        }
        // Text inputs produce string-typed numbers.
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            if let Ok(n) = s.trim().parse::<u64>() {
                return Some(n);
            }
        }
    }
    None
}

/// Extract an entity id from arg0, which may be a bare string, a number, or
/// an object carrying one of `keys`.
pub(crate) fn payload_id(arg0: Option<Value>, keys: &[&str]) -> Option<String> {
    match arg0? {
        Value::String(s) => {
            let trimmed = s.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }
        Value::Number(n) => Some(n.to_string()),
        ref v @ Value::Object(_) => value_str(v, keys).or_else(|| {
            for key in keys {
                if let Some(n) = v.get(*key).and_then(Value::as_i64) {
                    return Some(n.to_string());
                }
            }
            None
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// App entry
// ---------------------------------------------------------------------------

fn log_dir() -> std::path::PathBuf {
    std::env::var_os("DISEM_ADMIN_LOG_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("disem-admin").join("logs"))
}

pub fn run() {
    // Structured logging: console + daily rolling file.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,disem_admin_lib=debug"));

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "admin");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the app — dropping it flushes
    // logs. Leaked intentionally since the app runs until process exit.
    std::mem::forget(_guard);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("BUILD_GIT_SHA"),
        backend = %config::resolve_base_url(),
        "Starting DISEM Admin"
    );

    tauri::Builder::default()
        .setup(|app| {
            use tauri::Manager;

            app.manage(session::SessionState::new(Box::new(
                session::KeyringTokenStore,
            )));
            app.manage(pager::PagerRegistry::default());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Auth / session
            commands::auth::auth_login,
            commands::auth::auth_logout,
            commands::auth::auth_current_session,
            // Clients
            commands::clients::clients_list,
            commands::clients::client_create,
            commands::clients::client_update,
            commands::clients::client_delete,
            // Credits and payments
            commands::credits::credits_list,
            commands::credits::credit_create,
            commands::credits::credit_update,
            commands::credits::credit_delete,
            commands::credits::credit_apply_payment,
            commands::credits::credit_balance,
            commands::credits::credit_void_payment,
            // Inventory audits
            commands::inventory::inventory_adjustments_recent,
            commands::inventory::inventory_adjustment_create,
            commands::inventory::inventory_adjustment_delete,
            commands::inventory::inventory_delta_preview,
            // Lookup tables
            commands::lookups::lookup_list,
            commands::lookups::lookup_create,
            commands::lookups::lookup_update,
            commands::lookups::lookup_delete,
            // Banners / CMS
            commands::banners::banner_image_upload,
            commands::banners::banner_image_update,
            commands::banners::banner_image_delete,
            // Company info singleton
            commands::company::company_info_get,
            commands::company::company_info_save,
            // Settings
            commands::settings::settings_backend_url_get,
            commands::settings::settings_backend_url_set,
            commands::settings::settings_reset,
            // View lifecycle
            commands::view_notification_current,
            commands::view_notification_dismiss,
            commands::view_form_state,
            commands::view_form_cancel,
            commands::view_teardown,
        ])
        .run(tauri::generate_context!())
        .expect("error while running DISEM Admin");
}
