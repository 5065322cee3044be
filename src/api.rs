// ============================================================================
// EDIT API — the remote image-editing collaborator
// ============================================================================
//
// `EditBackend` is the seam between the edit cycle and the network. The HTTP
// implementation posts a multipart form (prompt, model, JPEG source, PNG mask)
// and expects `{ "data": [ { "url": ... } | { "b64_json": ... } ] }` back.

use base64::Engine;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::Settings;
use crate::error::{EditError, Result};

/// Where the edited image can be found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageRef {
    /// `http(s)://` URL or a `data:` URI.
    Url(String),
    /// Already-encoded image bytes.
    Inline(Vec<u8>),
}

/// Everything sent to the API for one edit cycle.
#[derive(Clone, Debug)]
pub struct EditRequest {
    pub prompt: String,
    /// Source image, fitted to the upload bound, JPEG-encoded.
    pub image_jpeg: Vec<u8>,
    /// Stencil at the same dimensions as the uploaded source, PNG with alpha.
    pub mask_png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// The remote image-editing collaborator.
#[allow(async_fn_in_trait)]
pub trait EditBackend {
    /// Submit one edit request and return a reference to the edited image.
    async fn submit(&self, request: &EditRequest) -> Result<ImageRef>;

    /// Download the bytes behind an image URL returned by `submit`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

// -- Response bodies ---------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl ApiErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or_else(|| self.error.and_then(|e| e.message))
            .filter(|m| !m.trim().is_empty())
    }
}

/// Turn a raw HTTP status + body into an image reference or a cycle error.
///
/// Non-2xx statuses become [`EditError::Network`] carrying the body's message
/// (or the reason phrase when the body has none). A 2xx body without a usable
/// `url` / `b64_json` entry is [`EditError::ResponseShape`].
pub fn parse_generation_response(status: u16, reason: Option<&str>, body: &[u8]) -> Result<ImageRef> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<ApiErrorBody>(body)
            .ok()
            .and_then(ApiErrorBody::into_message)
            .or_else(|| reason.map(str::to_string))
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(EditError::Network { status, message });
    }

    let parsed: GenerationResponse =
        serde_json::from_slice(body).map_err(|_| EditError::ResponseShape)?;
    let Some(first) = parsed.data.into_iter().next() else {
        return Err(EditError::ResponseShape);
    };

    if let Some(url) = first.url.filter(|u| !u.trim().is_empty()) {
        return Ok(ImageRef::Url(url));
    }
    if let Some(b64) = first.b64_json.filter(|b| !b.trim().is_empty()) {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|e| EditError::ImageDecode(format!("invalid base64 image: {}", e)))?;
        return Ok(ImageRef::Inline(bytes));
    }
    Err(EditError::ResponseShape)
}

// -- HTTP backend ------------------------------------------------------------

/// `EditBackend` over HTTPS with bearer-token authentication.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_endpoint, &settings.api_key, &settings.model)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EditBackend for HttpBackend {
    async fn submit(&self, request: &EditRequest) -> Result<ImageRef> {
        let image = Part::bytes(request.image_jpeg.clone())
            .file_name("original_image.jpeg")
            .mime_str("image/jpeg")?;
        let mask = Part::bytes(request.mask_png.clone())
            .file_name("mask.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("prompt", request.prompt.clone())
            .text("model", self.model.clone())
            .part("image", image)
            .part("mask", mask);

        let mut builder = self.client.post(&self.endpoint).multipart(form);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        parse_generation_response(status.as_u16(), status.canonical_reason(), &body)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EditError::ImageDecode(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EditError::ImageDecode(format!(
                "HTTP error: {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| EditError::ImageDecode(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
