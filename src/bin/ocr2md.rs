//! CLI binary for edgequake-ocr2md.
//!
//! Takes no operational arguments: configuration comes from the environment
//! (and `.env`). Converts every PDF in the input folder, prints a summary,
//! and exits 0 even when some documents failed. Only setup failures (missing
//! API key, bad configuration, folders that cannot be created) exit non-zero.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_ocr2md::{
    run_batch, BatchConfig, BatchProgressCallback, DocumentError, DocumentOutput, DocumentStage,
    ImageDecodeError, ProgressCallback, RunSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the batch plus a log line per
/// document, saved image and skipped image.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} PDFs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        if total_documents == 0 {
            return;
        }
        self.bar.set_length(total_documents as u64);
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_documents} PDF(s) to process"))
        ));
    }

    fn on_document_start(&self, document: &str, index: usize, total: usize) {
        self.bar.println(format!(
            "{} Processing {} {}",
            cyan("◆"),
            bold(document),
            dim(&format!("({index}/{total})"))
        ));
    }

    fn on_stage(&self, document: &str, stage: DocumentStage) {
        self.bar.set_message(format!("{document}: {stage}"));
    }

    fn on_image_saved(&self, _document: &str, file_name: &str) {
        self.bar
            .println(format!("  {} Saved image: {}", green("✓"), dim(file_name)));
    }

    fn on_image_skipped(&self, _document: &str, error: &ImageDecodeError) {
        self.bar
            .println(format!("  {} {}", yellow("⚠"), yellow(&error.to_string())));
    }

    fn on_document_complete(&self, document: &str, output: &DocumentOutput) {
        self.bar.println(format!(
            "  {} {} → {}  {}",
            green("✔"),
            document,
            bold(&output.markdown_path.display().to_string()),
            dim(&format!(
                "{} pages, {} images",
                output.page_count,
                output.images.len()
            )),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, _document: &str, error: &DocumentError) {
        self.bar
            .println(format!("  {} {}", red("✘"), red(&error.to_string())));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"FOLDERS:
  pdfs_to_process/   drop PDFs here
  ocr_output/<name>/ <name>.md, page{N}_img{K}.{ext}, .metadata/ocr_response.json
  pdfs-done/         sources are moved here after a successful conversion

  A PDF that fails stays in pdfs_to_process/ and is retried on the next run.

ENVIRONMENT VARIABLES (also read from .env):
  MISTRAL_API_KEY                  Mistral API key (required)
  MISTRAL_API_BASE                 API base URL (default https://api.mistral.ai/v1)
  OCR2MD_MODEL                     OCR model (default mistral-ocr-latest)
  OCR2MD_INPUT_DIR                 Input folder (default pdfs_to_process)
  OCR2MD_DONE_DIR                  Archive folder (default pdfs-done)
  OCR2MD_OUTPUT_DIR                Output root (default ocr_output)
  OCR2MD_SIGNED_URL_EXPIRY_HOURS   Signed URL lifetime (default 1)
  OCR2MD_REQUEST_TIMEOUT_SECS      Per-request timeout (default 300)
  RUST_LOG                         Log filter, e.g. RUST_LOG=edgequake_ocr2md=debug

EXIT STATUS:
  0  the batch ran (some documents may have failed; see the summary)
  1  setup failed before any document was processed
"#;

/// Convert every PDF in the input folder to Markdown using Mistral OCR.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2md",
    version,
    about = "Convert every PDF in the input folder to Markdown using Mistral OCR",
    long_about = "Uploads each PDF in the input folder to Mistral OCR, writes the returned pages \
as one Markdown file with the embedded images extracted next to it, keeps the raw OCR response \
for inspection, and moves the PDF to the archive folder once it has been converted.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();

    dotenvy::dotenv().ok();

    // ── Logging setup ────────────────────────────────────────────────────
    // With a terminal the progress callback prints everything the user needs,
    // so library logs are limited to errors. Otherwise (CI, redirected output)
    // the library's info-level logs are the only progress report.
    let interactive = io::stderr().is_terminal();
    let filter = if interactive { "error" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    eprintln!("{} {}", cyan("◆"), bold("Starting PDF to Markdown converter…"));

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = BatchConfig::from_env().context("Failed to read configuration")?;
    if interactive {
        builder = builder.progress_callback(CliProgressCallback::new() as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    if let Some(ref key) = config.api_key {
        eprintln!("{} Loaded API key: {}", green("✓"), key_preview(key));
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = run_batch(&config)
        .await
        .context("Failed to set up environment. Exiting")?;

    print_summary(&summary, &config);
    Ok(())
}

/// First four characters of the key, never more.
fn key_preview(key: &str) -> String {
    let head: String = key.chars().take(4).collect();
    format!("{head}...")
}

fn print_summary(summary: &RunSummary, config: &BatchConfig) {
    if summary.attempted == 0 {
        println!(
            "{}",
            yellow(&format!("No PDFs found in {}", config.input_dir.display()))
        );
    } else if summary.all_succeeded() {
        println!(
            "{}",
            green(&format!("All {} PDFs processed successfully!", summary.succeeded))
        );
    } else {
        println!(
            "{}",
            yellow(&format!(
                "Processed {} out of {} PDFs successfully",
                summary.succeeded, summary.attempted
            ))
        );
    }
}
