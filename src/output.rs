//! Result types produced by the document pipeline.
//!
//! [`DocumentOutput`] describes one finished output bundle, [`RunSummary`]
//! aggregates a whole batch, and [`DocumentStage`] names the steps a document
//! goes through so failures can say where they happened.

use crate::error::ImageDecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Stage of the per-document state machine.
///
/// A document walks these in declaration order. The stage recorded when a
/// failure happens is the one the pipeline had entered last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocumentStage {
    Pending,
    Reading,
    Submitted,
    ResultReceived,
    ResultPersisted,
    Assembling,
    Written,
    Archived,
}

impl fmt::Display for DocumentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentStage::Pending => "queued",
            DocumentStage::Reading => "reading the source file",
            DocumentStage::Submitted => "uploading",
            DocumentStage::ResultReceived => "running OCR",
            DocumentStage::ResultPersisted => "saving the OCR response",
            DocumentStage::Assembling => "processing markdown and images",
            DocumentStage::Written => "saving the markdown",
            DocumentStage::Archived => "archiving the source file",
        };
        f.write_str(s)
    }
}

/// One image written into a document's output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    /// 1-indexed page the image came from.
    pub page_num: usize,
    /// Id assigned by the OCR provider (the placeholder key in the markdown).
    pub original_id: String,
    /// Flat file name, `page{N}_img{K}{ext}`.
    pub file_name: String,
}

/// Everything a successful document run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutput {
    /// Source file name without extension.
    pub base_name: String,
    /// `{output_root}/{base_name}`.
    pub output_dir: PathBuf,
    /// `{output_dir}/{base_name}.md`.
    pub markdown_path: PathBuf,
    /// `{output_dir}/.metadata/ocr_response.json`.
    pub metadata_path: PathBuf,
    /// Where the source file was moved.
    pub archived_to: PathBuf,
    /// Pages in the OCR response.
    pub page_count: usize,
    /// Images written, in document order.
    pub images: Vec<ImageFile>,
    /// Images that could not be decoded and were left out.
    pub skipped_images: Vec<ImageDecodeError>,
    /// Image links left pointing at something that is not an output file.
    pub unresolved_links: usize,
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Documents the batch tried to process.
    pub attempted: usize,
    /// Documents that reached the archive.
    pub succeeded: usize,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.attempted.saturating_sub(self.succeeded)
    }

    /// `true` when every attempted document succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.attempted
    }

    pub(crate) fn record(&mut self, success: bool) {
        self.attempted += 1;
        if success {
            self.succeeded += 1;
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} out of {} processed successfully",
            self.succeeded, self.attempted
        )
    }
}
