//! Writing results to disk: OCR metadata, the Markdown file, and archiving
//! the source document.

use crate::error::Ocr2MdError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Hidden folder inside each output directory that holds the raw response.
pub const METADATA_DIR: &str = ".metadata";

/// File name of the persisted OCR response.
pub const OCR_RESPONSE_FILE: &str = "ocr_response.json";

/// Serialise the response with 4-space indentation; non-ASCII and key order
/// stay as received.
pub fn response_to_json(response: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    response.serialize(&mut ser)?;
    Ok(buf)
}

/// Create `output_dir` and its metadata folder, then write the response body
/// exactly as the provider returned it.
///
/// Returns the path of the written JSON file.
pub async fn save_ocr_response(output_dir: &Path, response: &Value) -> Result<PathBuf, Ocr2MdError> {
    let metadata_dir = output_dir.join(METADATA_DIR);
    tokio::fs::create_dir_all(&metadata_dir)
        .await
        .map_err(|source| Ocr2MdError::Write {
            path: metadata_dir.clone(),
            source,
        })?;

    let path = metadata_dir.join(OCR_RESPONSE_FILE);
    let json = response_to_json(response)
        .map_err(|e| Ocr2MdError::Internal(format!("Failed to serialise OCR response: {e}")))?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|source| Ocr2MdError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Write the Markdown file atomically (temp file + rename).
pub async fn write_markdown(path: &Path, markdown: &str) -> Result<(), Ocr2MdError> {
    let write_err = |source| Ocr2MdError::Write {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        tokio::fs::remove_file(&tmp_path).await.ok();
        return Err(write_err(e));
    }
    Ok(())
}

/// Move `source` into `done_dir` under the same file name.
///
/// Falls back to copy + delete when a plain rename is not possible (e.g. the
/// archive lives on another filesystem).
pub async fn archive_document(source: &Path, done_dir: &Path) -> Result<PathBuf, Ocr2MdError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| Ocr2MdError::Internal(format!("'{}' has no file name", source.display())))?;
    let dest = done_dir.join(file_name);

    let archive_err = |e| Ocr2MdError::Archive {
        from: source.to_path_buf(),
        to: dest.clone(),
        source: e,
    };

    match tokio::fs::rename(source, &dest).await {
        Ok(()) => {}
        Err(rename_err) => {
            debug!(
                "rename {} → {} failed ({}); copying instead",
                source.display(),
                dest.display(),
                rename_err
            );
            tokio::fs::copy(source, &dest).await.map_err(|_| archive_err(rename_err))?;
            if let Err(e) = tokio::fs::remove_file(source).await {
                warn!("Copied {} to the archive but could not remove it", source.display());
                return Err(archive_err(e));
            }
        }
    }
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Value {
        serde_json::json!({
            "pages": [{"markdown": "Größe – ½", "images": [{"id": "img-0.png", "image_base64": "AAAA"}]}],
            "model": "mistral-ocr-latest"
        })
    }

    #[test]
    fn json_is_indented_and_keeps_unicode() {
        let text = String::from_utf8(response_to_json(&sample()).unwrap()).unwrap();
        assert!(text.contains("Größe – ½"), "got: {text}");
        assert!(text.contains("\n    \"pages\": ["), "got: {text}");
    }

    #[tokio::test]
    async fn saves_response_under_metadata_dir() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("report");
        let path = save_ocr_response(&out, &sample()).await.unwrap();

        assert_eq!(path, out.join(".metadata").join("ocr_response.json"));
        let back: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(back, sample());
    }

    #[tokio::test]
    async fn saved_response_matches_provider_body() {
        let body = r#"{"pages":[{"index":0,"images":[{"id":"img-0.png"}]}],"usage_info":{"b":1,"a":2}}"#;
        let raw: Value = serde_json::from_str(body).unwrap();
        let tmp = TempDir::new().unwrap();
        let path = save_ocr_response(tmp.path(), &raw).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("markdown"), "got: {text}");
        assert!(!text.contains("image_base64"), "got: {text}");
        assert!(text.find("\"index\"").unwrap() < text.find("\"images\"").unwrap());
        assert!(text.find("\"b\"").unwrap() < text.find("\"a\"").unwrap());
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), raw);
    }

    #[tokio::test]
    async fn markdown_write_replaces_and_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.md");
        write_markdown(&path, "first").await.unwrap();
        write_markdown(&path, "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!tmp.path().join("report.md.tmp").exists());
    }

    #[tokio::test]
    async fn archive_moves_file() {
        let tmp = TempDir::new().unwrap();
        let src_dir = tmp.path().join("in");
        let done = tmp.path().join("done");
        std::fs::create_dir_all(&src_dir).unwrap();
        std::fs::create_dir_all(&done).unwrap();
        let src = src_dir.join("report.pdf");
        std::fs::write(&src, b"%PDF").unwrap();

        let dest = archive_document(&src, &done).await.unwrap();
        assert_eq!(dest, done.join("report.pdf"));
        assert!(!src.exists());
        assert_eq!(std::fs::read(dest).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn archive_into_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("report.pdf");
        std::fs::write(&src, b"%PDF").unwrap();

        let err = archive_document(&src, &tmp.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, Ocr2MdError::Archive { .. }));
        assert!(src.exists());
    }
}
