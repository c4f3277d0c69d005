//! Batch and per-document conversion entry points.
//!
//! [`run_batch`] is what the CLI calls: resolve the provider, make sure the
//! folders exist, then convert every discovered document one after another.
//! A failing document is logged, counted and left in the input folder; the
//! next document is started regardless.
//!
//! [`convert_document`] runs the per-document state machine:
//!
//! ```text
//! Pending → Reading → Submitted → ResultReceived → ResultPersisted
//!         → Assembling → Written → Archived
//! ```
//!
//! Any step can fail; the error is returned tagged with the stage that was
//! last entered.

use crate::config::BatchConfig;
use crate::error::{DocumentError, Ocr2MdError};
use crate::ocr::OcrClient;
use crate::output::{DocumentOutput, DocumentStage, RunSummary};
use crate::pipeline::input::{self, Layout};
use crate::pipeline::{assemble, images, persist, postprocess};
use crate::progress::{BatchProgressCallback, NoopProgressCallback};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Convert every document in the input folder.
///
/// # Returns
/// `Ok(RunSummary)` once every discovered document has been attempted, even
/// if some failed (check [`RunSummary::failed`]).
///
/// # Errors
/// Only setup failures, before any document is touched:
/// - no API key and no injected provider
/// - a working folder cannot be created
/// - the input folder cannot be listed
pub async fn run_batch(config: &BatchConfig) -> Result<RunSummary, Ocr2MdError> {
    let client = OcrClient::from_config(config)?;
    let layout = input::ensure_layout(config).await?;
    let documents = input::discover_documents(&layout.input_dir, &config.document_extension).await?;

    let noop = NoopProgressCallback;
    let progress: &dyn BatchProgressCallback = match config.progress_callback {
        Some(ref cb) => cb.as_ref(),
        None => &noop,
    };

    let total = documents.len();
    if total == 0 {
        info!("No documents found in {}", layout.input_dir.display());
    } else {
        info!("Found {} document(s) to process", total);
    }
    progress.on_batch_start(total);

    let mut summary = RunSummary::default();
    for (i, path) in documents.iter().enumerate() {
        let name = display_name(path);
        info!("Processing {} ({}/{})", name, i + 1, total);
        progress.on_document_start(&name, i + 1, total);

        match convert_document(path, &client, &layout, progress).await {
            Ok(output) => {
                info!(
                    "✓ {} → {} ({} images, {} skipped)",
                    name,
                    output.markdown_path.display(),
                    output.images.len(),
                    output.skipped_images.len()
                );
                progress.on_document_complete(&name, &output);
                summary.record(true);
            }
            Err(e) => {
                error!("{}", e);
                progress.on_document_error(&name, &e);
                summary.record(false);
            }
        }
    }

    if summary.failed() > 0 {
        warn!("{}", summary);
    } else if summary.attempted > 0 {
        info!("All {} document(s) processed successfully", summary.attempted);
    }
    progress.on_batch_complete(&summary);
    Ok(summary)
}

/// Convert one document and archive it.
///
/// The OCR response is saved before Markdown assembly starts, so it is
/// available for debugging even when a later step fails. Image decode
/// failures do not fail the document; they are listed in
/// [`DocumentOutput::skipped_images`].
pub async fn convert_document(
    path: &Path,
    client: &OcrClient,
    layout: &Layout,
    progress: &dyn BatchProgressCallback,
) -> Result<DocumentOutput, DocumentError> {
    let name = display_name(path);
    let mut stage = DocumentStage::Pending;

    let result = run_stages(path, &name, client, layout, progress, &mut stage).await;
    result.map_err(|source| DocumentError {
        document: name,
        stage,
        source,
    })
}

async fn run_stages(
    path: &Path,
    name: &str,
    client: &OcrClient,
    layout: &Layout,
    progress: &dyn BatchProgressCallback,
    stage: &mut DocumentStage,
) -> Result<DocumentOutput, Ocr2MdError> {
    let mut enter = |next: DocumentStage| {
        *stage = next;
        debug!("{}: {}", name, next);
        progress.on_stage(name, next);
    };

    // ── Reading ──────────────────────────────────────────────────────────
    enter(DocumentStage::Reading);
    let document = input::read_document(path).await?;
    let base_name = document.base_name;

    // ── Submitted ────────────────────────────────────────────────────────
    enter(DocumentStage::Submitted);
    let handle = client.submit(&document.file_name, document.bytes).await?;

    // ── ResultReceived ───────────────────────────────────────────────────
    enter(DocumentStage::ResultReceived);
    let result = client.fetch_result(&handle).await?;

    // ── ResultPersisted ──────────────────────────────────────────────────
    enter(DocumentStage::ResultPersisted);
    let output_dir = layout.output_dir_for(&base_name);
    let metadata_path = persist::save_ocr_response(&output_dir, &result.raw).await?;
    let response = result.response;
    debug!("OCR response saved in {}", metadata_path.display());

    // ── Assembling ───────────────────────────────────────────────────────
    enter(DocumentStage::Assembling);
    let mut next_index = images::FIRST_IMAGE_INDEX;
    let mut written = Vec::new();
    let mut skipped = Vec::new();
    let mut pages = Vec::with_capacity(response.pages.len());
    let mut unresolved_links = 0;

    for (i, page) in response.pages.iter().enumerate() {
        let page_num = i + 1;
        let extracted = images::extract_page_images(page_num, &page.images, next_index);
        next_index = extracted.next_index;

        for err in extracted.skipped {
            warn!("{}: skipping image: {}", name, err);
            progress.on_image_skipped(name, &err);
            skipped.push(err);
        }

        let mut page_files = Vec::with_capacity(extracted.decoded.len());
        for image in extracted.decoded {
            images::write_image(&output_dir, &image).await?;
            progress.on_image_saved(name, &image.file.file_name);
            page_files.push(image.file);
        }

        let assembled = assemble::assemble_page(&base_name, page_num, &page.markdown, &page_files);

        let leftovers = postprocess::find_unresolved_image_links(
            &assembled,
            page_files.iter().map(|f| f.file_name.as_str()),
        );
        for target in &leftovers {
            warn!("{}: page {} links to '{}', which is not an output file", name, page_num, target);
        }
        unresolved_links += leftovers.len();

        pages.push(assembled);
        written.extend(page_files);
    }

    let markdown = assemble::assemble_document(&base_name, client.label(), &pages);

    // ── Written ──────────────────────────────────────────────────────────
    enter(DocumentStage::Written);
    let markdown_path = output_dir.join(format!("{base_name}.md"));
    persist::write_markdown(&markdown_path, &markdown).await?;

    // ── Archived ─────────────────────────────────────────────────────────
    enter(DocumentStage::Archived);
    let archived_to = persist::archive_document(path, &layout.done_dir).await?;
    debug!("{} moved to {}", name, archived_to.display());

    Ok(DocumentOutput {
        base_name,
        output_dir,
        markdown_path,
        metadata_path,
        archived_to,
        page_count: response.pages.len(),
        images: written,
        skipped_images: skipped,
        unresolved_links,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
