//! Banner image commands.
//!
//! The webview sends image bytes base64-encoded; they are decoded here and
//! forwarded as `multipart/form-data` to the CMS endpoints.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use reqwest::Method;
use serde_json::Value;

use crate::forms;
use crate::gateway::Gateway;
use crate::session::SessionState;
use crate::{payload_id, value_str};

/// Multipart field name expected by the backend.
const IMAGE_FIELD: &str = "imagen";

/// Upload cap. Banner art beyond this is almost certainly a mis-picked file.
const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

struct ImagePayload {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

fn parse_image_payload(payload: &Value) -> Result<ImagePayload, String> {
    let file_name = forms::require_str(payload, &["fileName", "file_name", "nombre"], "File name")?;
    let mime_type = value_str(payload, &["mimeType", "mime_type", "contentType"])
        .unwrap_or_else(|| "image/png".to_string());
    if !mime_type.starts_with("image/") {
        return Err(format!("Unsupported banner file type: {mime_type}"));
    }

    let data = forms::require_str(payload, &["data", "base64"], "Image data")?;
    // Tolerate data-URL prefixes from canvas/file readers.
    let raw = data.rsplit(',').next().unwrap_or(&data);
    let bytes = BASE64_STANDARD
        .decode(raw)
        .map_err(|e| format!("Invalid image data: {e}"))?;
    if bytes.is_empty() {
        return Err("Image data is empty".into());
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(format!(
            "Image is too large ({} bytes, limit {MAX_IMAGE_BYTES})",
            bytes.len()
        ));
    }

    Ok(ImagePayload {
        file_name,
        mime_type,
        bytes,
    })
}

/// `POST /configuracion/banners/:id/imagenes` — add an image to a banner.
#[tauri::command]
pub async fn banner_image_upload(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing upload payload")?;
    let banner_id = forms::require_str(&payload, &["bannerId", "banner_id"], "Banner")?;
    let image = parse_image_payload(&payload)?;

    let gw = Gateway::from_session(&session);
    let path = format!("/configuracion/banners/{banner_id}/imagenes");
    gw.upload(
        Method::POST,
        &path,
        IMAGE_FIELD,
        &image.file_name,
        &image.mime_type,
        image.bytes,
    )
    .await
    .map_err(|e| e.to_string())
}

/// `PUT /configuracion/banners/imagenes/:id` — replace an existing image.
#[tauri::command]
pub async fn banner_image_update(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing update payload")?;
    let image_id = forms::require_str(&payload, &["imageId", "image_id", "id"], "Image")?;
    let image = parse_image_payload(&payload)?;

    let gw = Gateway::from_session(&session);
    let path = format!("/configuracion/banners/imagenes/{image_id}");
    gw.upload(
        Method::PUT,
        &path,
        IMAGE_FIELD,
        &image.file_name,
        &image.mime_type,
        image.bytes,
    )
    .await
    .map_err(|e| e.to_string())
}

/// `DELETE /configuracion/banners/imagenes/:id`.
#[tauri::command]
pub async fn banner_image_delete(
    arg0: Option<Value>,
    session: tauri::State<'_, SessionState>,
) -> Result<Value, String> {
    let id = payload_id(arg0, &["id", "imageId", "image_id"]).ok_or("Missing image id")?;

    let gw = Gateway::from_session(&session);
    gw.delete("/configuracion/banners/imagenes", &id)
        .await
        .map(|v| {
            if v.is_null() {
                serde_json::json!({ "success": true })
            } else {
                v
            }
        })
        .map_err(|e| e.to_string())
}
