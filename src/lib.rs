//! # edgequake-ocr2md
//!
//! Batch-convert PDF documents to Markdown with extracted images, using a
//! remote OCR service (Mistral OCR by default).
//!
//! ## Pipeline Overview
//!
//! ```text
//! pdfs_to_process/report.pdf
//!  │
//!  ├─ 1. Read      load bytes, reject empty files
//!  ├─ 2. Upload    send the document to the OCR service
//!  ├─ 3. OCR       signed URL → OCR with embedded base64 images
//!  ├─ 4. Persist   ocr_output/report/.metadata/ocr_response.json
//!  ├─ 5. Images    decode → ocr_output/report/page{N}_img{K}.{ext}
//!  ├─ 6. Markdown  page headers + rewritten image links → report.md
//!  └─ 7. Archive   move the source to pdfs-done/
//! ```
//!
//! Documents are processed one at a time. A document that fails at any step
//! stays in the input folder for the next run; the batch carries on with the
//! remaining files and reports `succeeded/total` at the end.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_ocr2md::{run_batch, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MISTRAL_API_KEY and the OCR2MD_* folder overrides.
//!     let config = BatchConfig::from_env()?.build()?;
//!     let summary = run_batch(&config).await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! ## Using another OCR service
//!
//! Implement [`OcrProvider`] and inject it with
//! [`BatchConfigBuilder::provider`]; no API key is needed then.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder};
pub use convert::{convert_document, run_batch};
pub use error::{DocumentError, ImageDecodeError, Ocr2MdError, ProviderError};
pub use ocr::{
    DocumentHandle, MistralProvider, OcrClient, OcrImage, OcrPage, OcrProvider, OcrResponse, OcrResult,
};
pub use output::{DocumentOutput, DocumentStage, ImageFile, RunSummary};
pub use pipeline::input::{ensure_layout, Layout};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
