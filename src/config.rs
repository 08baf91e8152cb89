//! Backend base-URL resolution.
//!
//! The REST backend location comes from, in order of precedence:
//! 1. a stored override in the credential store (set from the settings screen),
//! 2. the `DISEM_API_URL` environment variable (the legacy
//!    `NEXT_PUBLIC_API_URL` name is accepted for compatibility with the
//!    web deployment),
//! 3. `NEXT_PUBLIC_API_PORT` pointing at a localhost backend,
//! 4. the default `http://localhost:5000`.

use crate::storage;

/// Default backend for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

const ENV_API_URL: &str = "DISEM_API_URL";
const ENV_API_URL_LEGACY: &str = "NEXT_PUBLIC_API_URL";
const ENV_API_PORT: &str = "NEXT_PUBLIC_API_PORT";

/// Normalise a backend base URL:
/// - strip surrounding whitespace and trailing slashes
/// - ensure a scheme is present (https, or http for localhost)
/// - strip a trailing `/api` segment
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /api
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the backend base URL, already normalised.
pub fn resolve_base_url() -> String {
    if let Some(stored) = storage::get_credential(storage::KEY_API_BASE_URL) {
        let stored = stored.trim();
        if !stored.is_empty() {
            return normalize_base_url(stored);
        }
    }

    if let Some(url) = env_non_empty(ENV_API_URL).or_else(|| env_non_empty(ENV_API_URL_LEGACY)) {
        return normalize_base_url(&url);
    }

    if let Some(port) = env_non_empty(ENV_API_PORT) {
        if port.chars().all(|c| c.is_ascii_digit()) {
            return format!("http://localhost:{port}");
        }
    }

    DEFAULT_API_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_scheme() {
        assert_eq!(normalize_base_url("localhost:5000"), "http://localhost:5000");
        assert_eq!(normalize_base_url("api.disem.co"), "https://api.disem.co");
    }

    #[test]
    fn normalize_strips_trailing_slash_and_api() {
        assert_eq!(
            normalize_base_url("https://api.disem.co/"),
            "https://api.disem.co"
        );
        assert_eq!(
            normalize_base_url("https://api.disem.co/api/"),
            "https://api.disem.co"
        );
    }

    #[test]
    fn normalize_keeps_explicit_http() {
        assert_eq!(
            normalize_base_url("http://10.0.0.12:5000"),
            "http://10.0.0.12:5000"
        );
    }

    // Environment mutation is process-global, so these run serially.

    fn clear_env() {
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_API_URL_LEGACY);
        std::env::remove_var(ENV_API_PORT);
    }

    #[test]
    #[serial_test::serial]
    fn resolve_falls_back_to_default() {
        clear_env();
        assert_eq!(resolve_base_url(), DEFAULT_API_URL);
    }

    #[test]
    #[serial_test::serial]
    fn resolve_prefers_primary_env_over_legacy() {
        clear_env();
        std::env::set_var(ENV_API_URL, "https://api.disem.co/api/");
        std::env::set_var(ENV_API_URL_LEGACY, "https://old.disem.co");
        assert_eq!(resolve_base_url(), "https://api.disem.co");
        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn resolve_accepts_legacy_name() {
        clear_env();
        std::env::set_var(ENV_API_URL_LEGACY, "api.disem.co");
        assert_eq!(resolve_base_url(), "https://api.disem.co");
        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn resolve_builds_localhost_url_from_port() {
        clear_env();
        std::env::set_var(ENV_API_PORT, "5050");
        assert_eq!(resolve_base_url(), "http://localhost:5050");

        // Non-numeric ports are ignored.
        std::env::set_var(ENV_API_PORT, "50x0");
        assert_eq!(resolve_base_url(), DEFAULT_API_URL);
        clear_env();
    }
}
