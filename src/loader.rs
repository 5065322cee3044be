//! Asynchronous loading of the edited image returned by the API.

use base64::Engine;
use image::RgbaImage;

use crate::api::{EditBackend, ImageRef};
use crate::error::{EditError, Result};
use crate::io::decode_bytes;

/// Resolve an [`ImageRef`] to decoded RGBA pixels.
///
/// URLs are downloaded through the backend, `data:` URIs and inline bytes are
/// used directly. Decoding runs on the blocking pool and is awaited, so the
/// caller simply suspends until the image is ready or has failed.
pub async fn load_image_ref<B: EditBackend>(backend: &B, image_ref: ImageRef) -> Result<RgbaImage> {
    let bytes = match image_ref {
        ImageRef::Inline(bytes) => bytes,
        ImageRef::Url(url) if url.starts_with("data:") => decode_data_uri(&url)?,
        ImageRef::Url(url) => backend.fetch(&url).await?,
    };
    if bytes.is_empty() {
        return Err(EditError::ImageDecode("empty image data".to_string()));
    }

    tokio::task::spawn_blocking(move || decode_bytes(&bytes))
        .await
        .map_err(|e| EditError::ImageDecode(e.to_string()))?
        .map_err(|e| EditError::ImageDecode(e.to_string()))
}

/// Decode `data:image/...;base64,...` into raw bytes.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let payload = uri
        .find(";base64,")
        .map(|pos| &uri[pos + 8..])
        .ok_or_else(|| EditError::ImageDecode("invalid data URI format".to_string()))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| EditError::ImageDecode(format!("invalid base64 image: {}", e)))
}
