//! Mistral OCR over its HTTP API.
//!
//! Three calls per document:
//!
//! 1. `POST /files` (multipart, `purpose=ocr`) → file id
//! 2. `GET /files/{id}/url?expiry=H` → signed URL
//! 3. `POST /ocr` with `include_image_base64: true` → pages + images

use super::OcrProvider;
use crate::error::{Ocr2MdError, ProviderError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 300;

/// [`OcrProvider`] backed by the Mistral API.
#[derive(Clone)]
pub struct MistralProvider {
    http: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for MistralProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct UploadedFile {
    id: String,
}

#[derive(Deserialize)]
struct SignedUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentUrlChunk<'a>,
    include_image_base64: bool,
}

#[derive(Debug, Serialize)]
struct DocumentUrlChunk<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    document_url: &'a str,
}

impl MistralProvider {
    /// Create a provider for `base_url` (e.g. `https://api.mistral.ai/v1`).
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Result<Self, Ocr2MdError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Ocr2MdError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turn a non-success response into a [`ProviderError`]; pass others through.
    async fn check(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, ProviderError> {
        let text = response.text().await.map_err(transport)?;
        serde_json::from_str(&text).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

fn transport(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Transport(format!("request timed out: {e}"))
    } else {
        ProviderError::Transport(e.to_string())
    }
}

/// Map an HTTP error status and body to the matching [`ProviderError`].
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let detail = truncate(body.trim(), MAX_ERROR_BODY);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth {
            status: status.as_u16(),
            detail,
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { detail },
        _ => ProviderError::Http {
            status: status.as_u16(),
            detail,
        },
    }
}

/// Content type sent with an upload, picked from the file extension.
///
/// Mistral OCR reads PDFs and images; anything else goes up as
/// `application/octet-stream` and is left to the service to reject.
fn mime_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("tif" | "tiff") => "image/tiff",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

#[async_trait]
impl OcrProvider for MistralProvider {
    fn label(&self) -> &str {
        "Mistral OCR"
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ProviderError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type(file_name))
            .map_err(|e| ProviderError::Rejected(e.to_string()))?;
        let form = Form::new().text("purpose", "ocr").part("file", part);

        let response = self
            .http
            .post(self.endpoint("files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let uploaded: UploadedFile = Self::read_json(Self::check(response).await?).await?;
        debug!("Mistral file id for {}: {}", file_name, uploaded.id);
        Ok(uploaded.id)
    }

    async fn signed_url(&self, file_id: &str, expiry_hours: u32) -> Result<String, ProviderError> {
        let response = self
            .http
            .get(self.endpoint(&format!("files/{file_id}/url")))
            .query(&[("expiry", expiry_hours)])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport)?;
        let signed: SignedUrl = Self::read_json(Self::check(response).await?).await?;
        Ok(signed.url)
    }

    async fn process(&self, document_url: &str, model: &str) -> Result<Value, ProviderError> {
        let request = OcrRequest {
            model,
            document: DocumentUrlChunk {
                kind: "document_url",
                document_url,
            },
            include_image_base64: true,
        };

        let response = self
            .http
            .post(self.endpoint("ocr"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        Self::read_json(Self::check(response).await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_request_shape() {
        let request = OcrRequest {
            model: "mistral-ocr-latest",
            document: DocumentUrlChunk {
                kind: "document_url",
                document_url: "https://files.example/abc?sig=1",
            },
            include_image_base64: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "mistral-ocr-latest",
                "document": {
                    "type": "document_url",
                    "document_url": "https://files.example/abc?sig=1"
                },
                "include_image_base64": true
            })
        );
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let p = MistralProvider::new("k", "https://api.mistral.ai/v1/", 10).unwrap();
        assert_eq!(p.endpoint("files"), "https://api.mistral.ai/v1/files");
        assert_eq!(p.endpoint("/ocr"), "https://api.mistral.ai/v1/ocr");
    }

    #[test]
    fn classify_auth_and_rate_limit() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "bad key"),
            ProviderError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, ""),
            ProviderError::Auth { status: 403, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "quota"),
            ProviderError::RateLimited { .. }
        ));
        match classify_status(StatusCode::BAD_GATEWAY, "  upstream  ") {
            ProviderError::Http { status, detail } => {
                assert_eq!(status, 502);
                assert_eq!(detail, "upstream");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "é".repeat(MAX_ERROR_BODY + 50);
        let ProviderError::Http { detail, .. } = classify_status(StatusCode::INTERNAL_SERVER_ERROR, &body) else {
            panic!("expected Http");
        };
        assert_eq!(detail.chars().count(), MAX_ERROR_BODY + 1);
        assert!(detail.ends_with('\u{2026}'));
    }

    #[test]
    fn upload_content_type_follows_extension() {
        assert_eq!(mime_type("report.pdf"), "application/pdf");
        assert_eq!(mime_type("SCAN.PDF"), "application/pdf");
        assert_eq!(mime_type("page.JPG"), "image/jpeg");
        assert_eq!(mime_type("page.png"), "image/png");
        assert_eq!(mime_type("notes.docx"), "application/octet-stream");
        assert_eq!(mime_type("no_extension"), "application/octet-stream");
        assert!(Part::bytes(vec![1]).mime_str(mime_type("x.tiff")).is_ok());
    }

    #[test]
    fn debug_hides_api_key() {
        let p = MistralProvider::new("secret", "https://api.mistral.ai/v1", 10).unwrap();
        assert!(!format!("{p:?}").contains("secret"));
    }
}
