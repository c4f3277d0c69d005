//! Configuration types for batch OCR conversion.
//!
//! Every knob lives in [`BatchConfig`], built via [`BatchConfigBuilder`] or
//! read from the environment with [`BatchConfig::from_env`]. The CLI takes no
//! operational flags, so the environment (and a `.env` file loaded by the
//! binary) is the only way to change folders, model or endpoint.

use crate::error::Ocr2MdError;
use crate::ocr::OcrProvider;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Environment variable holding the OCR service API key.
pub const API_KEY_VAR: &str = "MISTRAL_API_KEY";

/// Default OCR model.
pub const DEFAULT_MODEL: &str = "mistral-ocr-latest";

/// Default OCR service endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Configuration for one batch run.
///
/// # Example
/// ```rust
/// use edgequake_ocr2md::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .input_dir("inbox")
///     .done_dir("inbox/done")
///     .api_key("sk-test")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "mistral-ocr-latest");
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Folder scanned for documents. Default: `pdfs_to_process`.
    pub input_dir: PathBuf,

    /// Folder that receives successfully processed sources. Default: `pdfs-done`.
    pub done_dir: PathBuf,

    /// Root of the per-document output folders. Default: `ocr_output`.
    pub output_root: PathBuf,

    /// OCR model identifier. Default: `mistral-ocr-latest`.
    pub model: String,

    /// API key for the OCR service. Required unless `provider` is set.
    pub api_key: Option<String>,

    /// Base URL of the OCR service API. Default: `https://api.mistral.ai/v1`.
    pub api_base_url: String,

    /// Lifetime of the signed document URL, in hours. Default: 1.
    ///
    /// The URL is used exactly once, right after upload.
    pub signed_url_expiry_hours: u32,

    /// Per-request HTTP timeout in seconds. Default: 300.
    ///
    /// OCR of a long document happens inside a single request.
    pub request_timeout_secs: u64,

    /// Extension (without dot, case-insensitive) of documents to pick up. Default: `pdf`.
    pub document_extension: String,

    /// Pre-constructed OCR provider. Takes precedence over `api_key`.
    pub provider: Option<Arc<dyn OcrProvider>>,

    /// Receives batch progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("pdfs_to_process"),
            done_dir: PathBuf::from("pdfs-done"),
            output_root: PathBuf::from("ocr_output"),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            signed_url_expiry_hours: 1,
            request_timeout_secs: 300,
            document_extension: "pdf".to_string(),
            provider: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("input_dir", &self.input_dir)
            .field("done_dir", &self.done_dir)
            .field("output_root", &self.output_root)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("signed_url_expiry_hours", &self.signed_url_expiry_hours)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("document_extension", &self.document_extension)
            .field("provider", &self.provider.as_ref().map(|p| p.label().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from process environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `OCR2MD_INPUT_DIR` | `input_dir` |
    /// | `OCR2MD_DONE_DIR` | `done_dir` |
    /// | `OCR2MD_OUTPUT_DIR` | `output_root` |
    /// | `OCR2MD_MODEL` | `model` |
    /// | `MISTRAL_API_KEY` | `api_key` |
    /// | `MISTRAL_API_BASE` | `api_base_url` |
    /// | `OCR2MD_SIGNED_URL_EXPIRY_HOURS` | `signed_url_expiry_hours` |
    /// | `OCR2MD_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |
    ///
    /// A missing API key is *not* an error here; it surfaces when the
    /// provider is resolved.
    pub fn from_env() -> Result<BatchConfigBuilder, Ocr2MdError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`BatchConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<BatchConfigBuilder, Ocr2MdError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(v) = get("OCR2MD_INPUT_DIR") {
            builder = builder.input_dir(v);
        }
        if let Some(v) = get("OCR2MD_DONE_DIR") {
            builder = builder.done_dir(v);
        }
        if let Some(v) = get("OCR2MD_OUTPUT_DIR") {
            builder = builder.output_root(v);
        }
        if let Some(v) = get("OCR2MD_MODEL") {
            builder = builder.model(v);
        }
        if let Some(v) = get(API_KEY_VAR) {
            builder = builder.api_key(v);
        }
        if let Some(v) = get("MISTRAL_API_BASE") {
            builder = builder.api_base_url(v);
        }
        if let Some(v) = get("OCR2MD_SIGNED_URL_EXPIRY_HOURS") {
            builder = builder.signed_url_expiry_hours(parse_env("OCR2MD_SIGNED_URL_EXPIRY_HOURS", &v)?);
        }
        if let Some(v) = get("OCR2MD_REQUEST_TIMEOUT_SECS") {
            builder = builder.request_timeout_secs(parse_env("OCR2MD_REQUEST_TIMEOUT_SECS", &v)?);
        }
        Ok(builder)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, Ocr2MdError> {
    value.trim().parse().map_err(|_| {
        Ocr2MdError::InvalidConfig(format!("{key} must be a positive integer, got '{value}'"))
    })
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl fmt::Debug for BatchConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl BatchConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn done_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.done_dir = dir.into();
        self
    }

    pub fn output_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_root = dir.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn signed_url_expiry_hours(mut self, hours: u32) -> Self {
        self.config.signed_url_expiry_hours = hours;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn document_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.document_extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn OcrProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, Ocr2MdError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Ocr2MdError::InvalidConfig("Model must not be empty".into()));
        }
        if c.signed_url_expiry_hours == 0 {
            return Err(Ocr2MdError::InvalidConfig(
                "Signed URL expiry must be ≥ 1 hour".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(Ocr2MdError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.document_extension.is_empty() {
            return Err(Ocr2MdError::InvalidConfig(
                "Document extension must not be empty".into(),
            ));
        }
        if same_folder(&c.input_dir, &c.done_dir) {
            return Err(Ocr2MdError::InvalidConfig(format!(
                "Input and archive folders must differ (both are '{}')",
                c.input_dir.display()
            )));
        }
        Ok(self.config)
    }
}

/// `true` when both paths name the same folder once `.` segments and
/// trailing separators are ignored (`pdfs`, `./pdfs/`).
fn same_folder(a: &Path, b: &Path) -> bool {
    let strip = |p: &Path| -> PathBuf {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };
    strip(a) == strip(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_folder_layout() {
        let c = BatchConfig::default();
        assert_eq!(c.input_dir, PathBuf::from("pdfs_to_process"));
        assert_eq!(c.done_dir, PathBuf::from("pdfs-done"));
        assert_eq!(c.output_root, PathBuf::from("ocr_output"));
        assert_eq!(c.model, "mistral-ocr-latest");
        assert_eq!(c.signed_url_expiry_hours, 1);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn build_rejects_same_input_and_done_dir() {
        let err = BatchConfig::builder()
            .input_dir("pdfs")
            .done_dir("pdfs")
            .build()
            .unwrap_err();
        assert!(matches!(err, Ocr2MdError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_zero_expiry() {
        let err = BatchConfig::builder()
            .signed_url_expiry_hours(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("expiry"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = BatchConfig::builder()
            .api_base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(c.api_base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let c = BatchConfig::from_lookup(lookup(&[
            ("OCR2MD_INPUT_DIR", "in"),
            ("OCR2MD_DONE_DIR", "done"),
            ("OCR2MD_OUTPUT_DIR", "out"),
            ("OCR2MD_MODEL", "mistral-ocr-2505"),
            ("MISTRAL_API_KEY", "abcd1234"),
            ("OCR2MD_SIGNED_URL_EXPIRY_HOURS", "2"),
            ("OCR2MD_REQUEST_TIMEOUT_SECS", " 60 "),
        ]))
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(c.input_dir, PathBuf::from("in"));
        assert_eq!(c.done_dir, PathBuf::from("done"));
        assert_eq!(c.output_root, PathBuf::from("out"));
        assert_eq!(c.model, "mistral-ocr-2505");
        assert_eq!(c.api_key.as_deref(), Some("abcd1234"));
        assert_eq!(c.signed_url_expiry_hours, 2);
        assert_eq!(c.request_timeout_secs, 60);
    }

    #[test]
    fn from_lookup_ignores_blank_key() {
        let c = BatchConfig::from_lookup(lookup(&[("MISTRAL_API_KEY", "  ")]))
            .unwrap()
            .build()
            .unwrap();
        assert!(c.api_key.is_none());
    }

    #[test]
    fn from_lookup_rejects_non_numeric_timeout() {
        let err = BatchConfig::from_lookup(lookup(&[("OCR2MD_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("OCR2MD_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = BatchConfig::builder().api_key("secret-key").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn input_and_archive_must_differ_after_normalising() {
        for (input, done) in [("pdfs", "pdfs"), ("pdfs", "./pdfs"), ("./pdfs/", "pdfs"), ("a/./pdfs", "a/pdfs")] {
            let err = BatchConfig::builder()
                .input_dir(input)
                .done_dir(done)
                .api_key("k")
                .build()
                .unwrap_err();
            assert!(matches!(err, Ocr2MdError::InvalidConfig(_)), "{input} vs {done}");
        }

        assert!(BatchConfig::builder()
            .input_dir("./pdfs")
            .done_dir("pdfs/done")
            .build()
            .is_ok());
    }
}
