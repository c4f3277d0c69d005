//! Input handling: working-folder layout, document discovery and reading.
//!
//! The layout is created once at startup by [`ensure_layout`]; creating a
//! folder that already exists is a no-op, so repeated runs are safe.
//! Discovery returns documents in file-name order so a batch is reproducible.

use crate::config::BatchConfig;
use crate::error::Ocr2MdError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The three working folders of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub input_dir: PathBuf,
    pub done_dir: PathBuf,
    pub output_root: PathBuf,
}

impl Layout {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            input_dir: config.input_dir.clone(),
            done_dir: config.done_dir.clone(),
            output_root: config.output_root.clone(),
        }
    }

    /// `{output_root}/{base_name}`.
    pub fn output_dir_for(&self, base_name: &str) -> PathBuf {
        self.output_root.join(base_name)
    }
}

/// A source document read into memory.
#[derive(Debug, Clone)]
pub struct Document {
    /// Where the document was found.
    pub path: PathBuf,
    /// File name with extension, e.g. `report.pdf`.
    pub file_name: String,
    /// File name without extension, e.g. `report`.
    pub base_name: String,
    /// Raw content.
    pub bytes: Vec<u8>,
}

/// Create the input, archive and output folders if they are missing.
pub async fn ensure_layout(config: &BatchConfig) -> Result<Layout, Ocr2MdError> {
    let layout = Layout::from_config(config);
    for dir in [&layout.input_dir, &layout.done_dir, &layout.output_root] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| Ocr2MdError::LayoutFailed {
                path: dir.clone(),
                source,
            })?;
    }
    debug!("Directories ready: {:?}", layout);
    Ok(layout)
}

/// List the regular files (or symlinks to them) in `input_dir` whose extension matches `extension`
/// (case-insensitive), sorted by file name.
pub async fn discover_documents(input_dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Ocr2MdError> {
    let scan_err = |source| Ocr2MdError::ScanFailed {
        path: input_dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(input_dir).await.map_err(scan_err)?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(scan_err)? {
        let path = entry.path();
        // metadata() follows symlinks, so a linked PDF counts as a file.
        let is_file = tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);
        if is_file && has_extension(&path, extension) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// The base name of a document path: its file name without extension.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a document into memory.
///
/// # Errors
/// [`Ocr2MdError::DocumentRead`] if the file cannot be read,
/// [`Ocr2MdError::EmptyDocument`] if it has no content.
pub async fn read_document(path: &Path) -> Result<Document, Ocr2MdError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| Ocr2MdError::DocumentRead {
            path: path.to_path_buf(),
            source,
        })?;

    if bytes.is_empty() {
        return Err(Ocr2MdError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }

    if !bytes.starts_with(b"%PDF") {
        warn!(
            "{} does not start with %PDF; submitting it anyway",
            path.display()
        );
    }

    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Document {
        path: path.to_path_buf(),
        file_name,
        base_name: base_name(path),
        bytes,
    })
}
