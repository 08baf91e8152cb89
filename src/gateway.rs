//! Remote data gateway.
//!
//! Translates typed intents (`list`, `get`, `create`, `update`, `delete`)
//! into HTTP calls and normalises the backend's two list shapes —
//! `{data: [...], total: N}` and a bare array — into a single
//! `Page {items, total}` contract. Every operation returns a typed error;
//! callers decide whether a failed list renders as an empty state or an
//! alert, the gateway never decides for them.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::api::{self, ApiError};
use crate::session::SessionState;

// ---------------------------------------------------------------------------
// List queries and pages
// ---------------------------------------------------------------------------

/// A 1-based page request with optional free-text search and extra
/// filter parameters (e.g. `estado=activo`).
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub page: u64,
    pub size: u64,
    pub search: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new(page: u64, size: u64, search: Option<String>) -> Result<Self, ApiError> {
        if page == 0 {
            return Err(ApiError::Config("page must be >= 1".into()));
        }
        if size == 0 {
            return Err(ApiError::Config("page size must be > 0".into()));
        }
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Self {
            page,
            size,
            search,
            extra: Vec::new(),
        })
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.extra.push((key.to_string(), value.to_string()));
        self
    }

    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.size.to_string()),
        ];
        if let Some(ref s) = self.search {
            params.push(("search".to_string(), s.clone()));
        }
        params.extend(self.extra.iter().cloned());
        params
    }
}

/// A normalised page of items.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub items: Vec<Value>,
    pub total: u64,
}

/// Normalise the two response shapes the backend produces for lists.
///
/// `{data: [...], total: N}` keeps the reported total; a bare array's total
/// is its own length. Anything else is an invalid response.
pub fn normalize_list_response(body: Value) -> Result<Page, ApiError> {
    match body {
        Value::Array(items) => {
            let total = items.len() as u64;
            Ok(Page { items, total })
        }
        Value::Object(mut obj) => {
            let items = match obj.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ApiError::InvalidResponse(
                        "list response is an object without a data array".into(),
                    ))
                }
            };
            let total = obj
                .get("total")
                .and_then(Value::as_u64)
                .unwrap_or(items.len() as u64);
            Ok(Page { items, total })
        }
        other => Err(ApiError::InvalidResponse(format!(
            "unexpected list response shape: {other}"
        ))),
    }
}

/// Clamp a 1-based page number to the range the reported total allows.
/// An empty result set keeps the caller on page 1.
pub fn clamp_page(page: u64, total: u64, size: u64) -> u64 {
    debug_assert!(size > 0);
    let last = total.div_ceil(size.max(1)).max(1);
    page.clamp(1, last)
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// A bound gateway: backend location plus the current bearer token.
/// Cheap to construct per call; the session remains the source of truth.
pub struct Gateway {
    base_url: String,
    token: Option<String>,
}

impl Gateway {
    pub fn from_session(session: &SessionState) -> Self {
        Self {
            base_url: crate::config::resolve_base_url(),
            token: session.bearer_token(),
        }
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// List one page of a collection resource.
    pub async fn list(&self, resource: &str, query: &ListQuery) -> Result<Page, ApiError> {
        let body = api::request_json(
            &self.base_url,
            self.token(),
            Method::GET,
            resource,
            &query.to_params(),
            None,
        )
        .await?;
        normalize_list_response(body)
    }

    /// Fetch a nested collection that is not paginated (e.g. the payments
    /// of one credit). Still normalised through `Page` for a single shape.
    pub async fn list_all(&self, path: &str) -> Result<Page, ApiError> {
        let body =
            api::request_json(&self.base_url, self.token(), Method::GET, path, &[], None).await?;
        normalize_list_response(body)
    }

    /// GET an arbitrary path as-is (singleton resources).
    pub async fn fetch(&self, path: &str) -> Result<Value, ApiError> {
        api::request_json(&self.base_url, self.token(), Method::GET, path, &[], None).await
    }

    /// Create an entity. The backend echoes the created entity and owns all
    /// generated fields (`id`, `createdAt`).
    pub async fn create(&self, resource: &str, payload: &Value) -> Result<Value, ApiError> {
        api::request_json(
            &self.base_url,
            self.token(),
            Method::POST,
            resource,
            &[],
            Some(payload),
        )
        .await
    }

    pub async fn update(&self, resource: &str, id: &str, payload: &Value) -> Result<Value, ApiError> {
        let path = format!("{resource}/{id}");
        api::request_json(
            &self.base_url,
            self.token(),
            Method::PATCH,
            &path,
            &[],
            Some(payload),
        )
        .await
    }

    /// PATCH an arbitrary path (singleton resources).
    pub async fn patch(&self, path: &str, payload: &Value) -> Result<Value, ApiError> {
        api::request_json(
            &self.base_url,
            self.token(),
            Method::PATCH,
            path,
            &[],
            Some(payload),
        )
        .await
    }

    /// Delete (or void, for entities with logical deletion server-side).
    /// A second void of the same entity is rejected by the backend and the
    /// rejection is forwarded untouched.
    pub async fn delete(&self, resource: &str, id: &str) -> Result<Value, ApiError> {
        let path = format!("{resource}/{id}");
        api::request_json(
            &self.base_url,
            self.token(),
            Method::DELETE,
            &path,
            &[],
            None,
        )
        .await
    }

    /// POST to an arbitrary path (non-CRUD intents such as applying a
    /// credit payment).
    pub async fn post(&self, path: &str, payload: &Value) -> Result<Value, ApiError> {
        api::request_json(
            &self.base_url,
            self.token(),
            Method::POST,
            path,
            &[],
            Some(payload),
        )
        .await
    }

    /// Multipart file upload.
    pub async fn upload(
        &self,
        method: Method,
        path: &str,
        field_name: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Value, ApiError> {
        api::upload_multipart(
            &self.base_url,
            self.token(),
            method,
            path,
            field_name,
            file_name,
            mime_type,
            bytes,
        )
        .await
    }
}

// Collection resource paths (backend contract).
pub const RES_CLIENTS: &str = "/clientes";
pub const RES_CREDITS: &str = "/creditos";
pub const RES_CREDIT_PAYMENTS: &str = "/pagos-credito";
pub const RES_INVENTORY_ADJUSTMENTS: &str = "/ajustes-inventario";
pub const RES_DOCUMENT_TYPES: &str = "/tipos-documento";
pub const RES_PAYMENT_METHODS: &str = "/metodos-pago";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_shape_keeps_reported_total() {
        let body = serde_json::json!({
            "data": [{"id": 1}, {"id": 2}],
            "total": 41
        });
        let page = normalize_list_response(body).expect("paginated shape");
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 41);
    }

    #[test]
    fn bare_array_total_is_length() {
        let body = serde_json::json!([{"id": 1}, {"id": 2}, {"id": 3}]);
        let page = normalize_list_response(body).expect("bare array shape");
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn object_without_data_is_rejected() {
        let body = serde_json::json!({ "total": 3 });
        assert!(normalize_list_response(body).is_err());
    }

    #[test]
    fn scalar_response_is_rejected() {
        assert!(normalize_list_response(serde_json::json!(42)).is_err());
    }

    #[test]
    fn missing_total_defaults_to_data_length() {
        let body = serde_json::json!({ "data": [{"id": 1}] });
        let page = normalize_list_response(body).expect("data without total");
        assert_eq!(page.total, 1);
    }

    #[test]
    fn clamp_page_bounds() {
        assert_eq!(clamp_page(5, 41, 10), 5);
        assert_eq!(clamp_page(6, 41, 10), 5);
        assert_eq!(clamp_page(0, 41, 10), 1);
        assert_eq!(clamp_page(3, 0, 10), 1);
        assert_eq!(clamp_page(1, 10, 10), 1);
        assert_eq!(clamp_page(2, 11, 10), 2);
    }

    #[test]
    fn list_query_validates_bounds() {
        assert!(ListQuery::new(0, 10, None).is_err());
        assert!(ListQuery::new(1, 0, None).is_err());
        let q = ListQuery::new(1, 10, Some("  ".into())).expect("valid query");
        assert!(q.search.is_none());
    }

    #[test]
    fn list_query_params_include_search() {
        let q = ListQuery::new(2, 25, Some("garcia".into())).expect("valid query");
        let params = q.to_params();
        assert!(params.contains(&("page".to_string(), "2".to_string())));
        assert!(params.contains(&("limit".to_string(), "25".to_string())));
        assert!(params.contains(&("search".to_string(), "garcia".to_string())));
    }
}
