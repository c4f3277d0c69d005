//! OCR response: pages of Markdown with embedded base64 images.
//!
//! Providers hand back the JSON body as received. [`OcrResult`] keeps that
//! value untouched for `ocr_response.json` and decodes a typed
//! [`OcrResponse`] view from it for the pipeline. Only the fields the pipeline
//! reads are typed; everything else (page index, dimensions, bounding boxes,
//! usage info, …) lands in the `extra` maps.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One OCR call's output: the body exactly as the provider sent it, plus
/// its decoded view.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    /// The JSON body, key order preserved.
    pub raw: Value,
    pub response: OcrResponse,
}

impl OcrResult {
    /// Decode `raw` into an [`OcrResponse`], keeping `raw` as-is.
    ///
    /// # Errors
    /// [`ProviderError::InvalidResponse`] when `pages` is missing or malformed.
    pub fn from_raw(raw: Value) -> Result<Self, ProviderError> {
        let response = OcrResponse::deserialize(&raw)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(Self { raw, response })
    }
}

/// The typed view of an OCR response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResponse {
    /// Pages in reading order.
    pub pages: Vec<OcrPage>,

    /// Model that produced the response, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the OCR response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    /// Markdown body; images appear as `![{id}]({id})` placeholders.
    #[serde(default)]
    pub markdown: String,

    #[serde(default)]
    pub images: Vec<OcrImage>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An image embedded in a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrImage {
    /// Provider-assigned id, e.g. `img-0.jpeg`.
    pub id: String,

    /// Base64 payload, optionally prefixed with `data:<mime>;base64,`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OcrResponse {
    /// Total number of embedded images across all pages.
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }
}

impl OcrPage {
    /// A page with the given markdown and no images.
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: OcrImage) -> Self {
        self.images.push(image);
        self
    }
}

impl OcrImage {
    pub fn new(id: impl Into<String>, image_base64: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_base64: Some(image_base64.into()),
            extra: Map::new(),
        }
    }
}
