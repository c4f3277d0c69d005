//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive events
//! as the batch walks through its documents. The CLI uses it to drive a
//! terminal progress bar; tests use it to observe which images were skipped.
//!
//! # Example
//!
//! ```rust
//! use edgequake_ocr2md::{BatchConfig, BatchProgressCallback, DocumentError};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter {
//!     failures: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for FailureCounter {
//!     fn on_document_error(&self, document: &str, error: &DocumentError) {
//!         self.failures.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{document}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(FailureCounter { failures: AtomicUsize::new(0) });
//!
//! let config = BatchConfig::builder()
//!     .api_key("test-key")
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::{DocumentError, ImageDecodeError};
use crate::output::{DocumentOutput, DocumentStage, RunSummary};
use std::sync::Arc;

/// Called by the batch orchestrator as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Documents are processed one at a time, but the
/// trait is `Send + Sync` so implementations can be shared with other tasks.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after discovery, before the first document.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document is picked up.
    ///
    /// # Arguments
    /// * `document` — source file name
    /// * `index`    — 1-indexed position in the batch
    /// * `total`    — documents in the batch
    fn on_document_start(&self, document: &str, index: usize, total: usize) {
        let _ = (document, index, total);
    }

    /// Called each time the document enters a new pipeline stage.
    fn on_stage(&self, document: &str, stage: DocumentStage) {
        let _ = (document, stage);
    }

    /// Called after an image file has been written.
    fn on_image_saved(&self, document: &str, file_name: &str) {
        let _ = (document, file_name);
    }

    /// Called when an embedded image is skipped because it could not be decoded.
    fn on_image_skipped(&self, document: &str, error: &ImageDecodeError) {
        let _ = (document, error);
    }

    /// Called when a document has been written and archived.
    fn on_document_complete(&self, document: &str, output: &DocumentOutput) {
        let _ = (document, output);
    }

    /// Called when a document fails; the batch then moves on.
    fn on_document_error(&self, document: &str, error: &DocumentError) {
        let _ = (document, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, summary: &RunSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
