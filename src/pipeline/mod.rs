//! Pipeline stages for OCR-to-Markdown conversion.
//!
//! Each submodule implements one step. The network-facing step lives in
//! [`crate::ocr`]; everything here is local string, path and file work, so
//! every stage can be tested without a provider.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ocr ──▶ persist ──▶ images ──▶ assemble ──▶ postprocess ──▶ persist
//! (read)   (remote) (json)     (decode)   (markdown)   (link check)    (md, archive)
//! ```
//!
//! 1. [`input`]       — create the working folders, discover and read documents
//! 2. [`persist`]     — save the raw OCR response for later inspection
//! 3. [`images`]      — decode base64 payloads and name the image files
//! 4. [`assemble`]    — page headers, placeholder rewriting, document header
//! 5. [`postprocess`] — report image links that still point nowhere
//! 6. [`persist`]     — write the Markdown atomically and archive the source

pub mod assemble;
pub mod images;
pub mod input;
pub mod persist;
pub mod postprocess;
