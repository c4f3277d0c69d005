//! OCR client adapter: submit a document, get back pages and images.
//!
//! The remote service is reached through the [`OcrProvider`] trait so the
//! pipeline never depends on a particular vendor or on the network in tests.
//! [`OcrClient`] layers the two-step contract the orchestrator uses on top of
//! it:
//!
//! ```text
//! submit(name, bytes) ──▶ DocumentHandle
//! fetch_result(handle) ──▶ signed_url ──▶ process ──▶ OcrResult { raw, response }
//! ```

mod mistral;
mod response;

pub use mistral::MistralProvider;
pub use response::{OcrImage, OcrPage, OcrResponse, OcrResult};

use crate::config::{BatchConfig, API_KEY_VAR};
use crate::error::{Ocr2MdError, ProviderError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// A remote OCR capability.
///
/// Implementations must be `Send + Sync`; the orchestrator holds them as
/// `Arc<dyn OcrProvider>`.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Human-readable service name, used in the generated Markdown header.
    fn label(&self) -> &str;

    /// Upload raw document bytes for OCR. Returns the remote file id.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ProviderError>;

    /// Obtain a short-lived URL the OCR endpoint can fetch the file from.
    async fn signed_url(&self, file_id: &str, expiry_hours: u32) -> Result<String, ProviderError>;

    /// Run OCR on the document at `document_url` with embedded images included.
    ///
    /// Returns the response body as received; [`OcrClient`] decodes it.
    async fn process(&self, document_url: &str, model: &str) -> Result<Value, ProviderError>;
}

/// Reference to a document that has been uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    /// Remote id assigned by the provider.
    pub file_id: String,
    /// Name the document was uploaded under.
    pub file_name: String,
}

/// Two-step OCR adapter used by the pipeline.
#[derive(Clone)]
pub struct OcrClient {
    provider: Arc<dyn OcrProvider>,
    model: String,
    signed_url_expiry_hours: u32,
}

impl OcrClient {
    pub fn new(provider: Arc<dyn OcrProvider>, model: impl Into<String>, signed_url_expiry_hours: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            signed_url_expiry_hours,
        }
    }

    /// Build a client from the configuration, resolving the provider.
    pub fn from_config(config: &BatchConfig) -> Result<Self, Ocr2MdError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(
            provider,
            config.model.clone(),
            config.signed_url_expiry_hours,
        ))
    }

    /// Service name for the provenance note.
    pub fn label(&self) -> &str {
        self.provider.label()
    }

    /// Upload a document.
    ///
    /// # Errors
    /// [`Ocr2MdError::Upload`] when `bytes` is empty or the provider call fails.
    pub async fn submit(&self, document_name: &str, bytes: Vec<u8>) -> Result<DocumentHandle, Ocr2MdError> {
        if bytes.is_empty() {
            return Err(Ocr2MdError::Upload {
                file_name: document_name.to_string(),
                source: ProviderError::Rejected("document is empty".into()),
            });
        }

        let size = bytes.len();
        let file_id = self
            .provider
            .upload(document_name, bytes)
            .await
            .map_err(|source| Ocr2MdError::Upload {
                file_name: document_name.to_string(),
                source,
            })?;
        debug!("Uploaded {} ({} bytes) as {}", document_name, size, file_id);

        Ok(DocumentHandle {
            file_id,
            file_name: document_name.to_string(),
        })
    }

    /// Sign the uploaded document's URL and run OCR on it.
    ///
    /// # Errors
    /// [`Ocr2MdError::Decode`] when signing or OCR fails, or the response is unusable.
    pub async fn fetch_result(&self, handle: &DocumentHandle) -> Result<OcrResult, Ocr2MdError> {
        let decode_err = |source| Ocr2MdError::Decode {
            file_name: handle.file_name.clone(),
            source,
        };

        let url = self
            .provider
            .signed_url(&handle.file_id, self.signed_url_expiry_hours)
            .await
            .map_err(decode_err)?;
        debug!("Signed URL obtained for {}", handle.file_id);

        let raw = self
            .provider
            .process(&url, &self.model)
            .await
            .map_err(decode_err)?;
        let result = OcrResult::from_raw(raw).map_err(decode_err)?;
        debug!(
            "OCR returned {} pages, {} images for {}",
            result.response.pages.len(),
            result.response.image_count(),
            handle.file_name
        );
        Ok(result)
    }
}

/// Resolve the OCR provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is; this is how
///    tests and embedders plug in their own service.
/// 2. **API key** (`config.api_key`) — a [`MistralProvider`] against
///    `config.api_base_url`.
///
/// With neither, the run cannot start: [`Ocr2MdError::MissingCredentials`].
pub fn resolve_provider(config: &BatchConfig) -> Result<Arc<dyn OcrProvider>, Ocr2MdError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {
            let provider = MistralProvider::new(key, &config.api_base_url, config.request_timeout_secs)?;
            Ok(Arc::new(provider))
        }
        _ => Err(Ocr2MdError::MissingCredentials {
            var: API_KEY_VAR.to_string(),
        }),
    }
}
