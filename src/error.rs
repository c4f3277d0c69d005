//! Error types for the edgequake-ocr2md library.
//!
//! Failures come in three scopes, each with its own type:
//!
//! * [`Ocr2MdError`] — **Fatal for its scope**: either the whole run cannot
//!   start (missing API key, bad configuration, folders cannot be created) or
//!   one document cannot be finished (unreadable source, upload rejected,
//!   output not writable). The batch loop catches the per-document kind and
//!   moves on to the next file.
//!
//! * [`DocumentError`] — an [`Ocr2MdError`] tagged with the document name and
//!   the [`DocumentStage`] it happened in, so a log line alone is enough to
//!   know which file failed and where.
//!
//! * [`ImageDecodeError`] — **Non-fatal**: one embedded image could not be
//!   decoded. It is logged, recorded in
//!   [`crate::output::DocumentOutput::skipped_images`], and the document
//!   carries on without that image.
//!
//! [`ProviderError`] describes what went wrong on the OCR service side and is
//! wrapped by the upload/decode variants of [`Ocr2MdError`].

use crate::output::DocumentStage;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the edgequake-ocr2md library.
///
/// Image-level failures use [`ImageDecodeError`] and never surface here.
#[derive(Debug, Error)]
pub enum Ocr2MdError {
    // ── Setup errors ──────────────────────────────────────────────────────
    /// No API key was supplied and no pre-built provider was injected.
    #[error("{var} not found in the environment or .env file\nTry: export {var}=...")]
    MissingCredentials { var: String },

    /// Builder validation failed or an environment value could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// One of the working folders could not be created.
    #[error("Failed to create directory '{path}': {source}")]
    LayoutFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input folder could not be listed.
    #[error("Failed to scan '{path}' for documents: {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Document I/O errors ───────────────────────────────────────────────
    /// The source document could not be read.
    #[error("Failed to read '{path}': {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source document has no content.
    #[error("PDF file '{path}' is empty")]
    EmptyDocument { path: PathBuf },

    // ── OCR provider errors ───────────────────────────────────────────────
    /// The document could not be uploaded to the OCR service.
    #[error("Failed to upload '{file_name}': {source}")]
    Upload {
        file_name: String,
        #[source]
        source: ProviderError,
    },

    /// The OCR service failed to process the document or returned garbage.
    #[error("OCR processing failed for '{file_name}': {source}")]
    Decode {
        file_name: String,
        #[source]
        source: ProviderError,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Metadata, an image, or the Markdown file could not be written.
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The processed source could not be moved into the archive folder.
    #[error("Failed to move '{from}' to '{to}': {source}")]
    Archive {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Ocr2MdError {
    /// `true` for errors that abort the whole run rather than one document.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Ocr2MdError::MissingCredentials { .. }
                | Ocr2MdError::InvalidConfig(_)
                | Ocr2MdError::LayoutFailed { .. }
                | Ocr2MdError::ScanFailed { .. }
        )
    }
}

/// Failure reported by an [`crate::ocr::OcrProvider`].
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// HTTP 401/403 — the key is wrong or lacks access. Retrying won't help.
    #[error("authentication rejected (HTTP {status}): {detail}")]
    Auth { status: u16, detail: String },

    /// HTTP 429 — quota or rate limit hit.
    #[error("rate limit exceeded (HTTP 429): {detail}")]
    RateLimited { detail: String },

    /// Any other non-success status.
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be sent as asked (e.g. empty payload).
    #[error("rejected request: {0}")]
    Rejected(String),
}

/// An [`Ocr2MdError`] tagged with the document and the stage it failed in.
#[derive(Debug, Error)]
#[error("{document}: failed while {stage}: {source}")]
pub struct DocumentError {
    /// File name of the source document.
    pub document: String,
    /// Last stage the pipeline entered before failing.
    pub stage: DocumentStage,
    #[source]
    pub source: Ocr2MdError,
}

/// A non-fatal error for a single embedded image.
///
/// The image is skipped; its placeholder stays untouched in the Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageDecodeError {
    /// The provider sent no `image_base64` for this image.
    #[error("Page {page}: image '{id}' has no payload")]
    MissingPayload { page: usize, id: String },

    /// A `data:` prefix without the terminating comma.
    #[error("Page {page}: image '{id}' has a malformed data URI")]
    MalformedDataUri { page: usize, id: String },

    /// The base64 body could not be decoded.
    #[error("Page {page}: image '{id}' is not valid base64: {detail}")]
    InvalidBase64 {
        page: usize,
        id: String,
        detail: String,
    },
}

impl ImageDecodeError {
    /// Provider-assigned id of the image that failed.
    pub fn image_id(&self) -> &str {
        match self {
            ImageDecodeError::MissingPayload { id, .. }
            | ImageDecodeError::MalformedDataUri { id, .. }
            | ImageDecodeError::InvalidBase64 { id, .. } => id,
        }
    }
}
