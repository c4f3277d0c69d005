//! Markdown assembly: page headers, link rewriting, document header.
//!
//! The output of a three-page document looks like:
//!
//! ```text
//! # {base}
//!
//! > This file was generated using {provider}. Images are stored alongside this markdown file.
//!
//! ---
//!
//! # {base}
//!
//! ## Page 1
//!
//! …page 1…
//!
//!
//! ---
//!
//! ## Page 2
//!
//! …page 2…
//! ```
//!
//! Placeholders are rewritten by exact literal match on `![{id}]({id})`. A
//! provider that emits another image syntax (extra attributes, different alt
//! text) is not rewritten; [`crate::pipeline::postprocess`] reports such
//! leftovers instead of guessing.

use crate::output::ImageFile;

/// Header placed before a page's Markdown.
///
/// Page 1 opens with the document title; later pages with a rule.
pub fn page_header(base_name: &str, page_num: usize) -> String {
    if page_num > 1 {
        format!("\n\n---\n\n## Page {page_num}\n\n")
    } else {
        format!("# {base_name}\n\n## Page {page_num}\n\n")
    }
}

/// Replace `![{id}]({id})` with `![{file}]({file})` for every renamed image.
pub fn rewrite_image_links(markdown: &str, images: &[ImageFile]) -> String {
    images.iter().fold(markdown.to_string(), |text, image| {
        let from = format!("![{0}]({0})", image.original_id);
        let to = format!("![{0}]({0})", image.file_name);
        text.replace(&from, &to)
    })
}

/// Rewrite a page's links and prefix it with its header.
pub fn assemble_page(base_name: &str, page_num: usize, markdown: &str, images: &[ImageFile]) -> String {
    let mut page = page_header(base_name, page_num);
    page.push_str(&rewrite_image_links(markdown, images));
    page
}

/// Title and provenance note placed once at the top of the document.
pub fn document_header(base_name: &str, provider_label: &str) -> String {
    format!(
        "# {base_name}\n\n\
         > This file was generated using {provider_label}. Images are stored alongside this markdown file.\n\n\
         ---\n\n"
    )
}

/// Join assembled pages under the document header.
pub fn assemble_document(base_name: &str, provider_label: &str, pages: &[String]) -> String {
    let mut doc = document_header(base_name, provider_label);
    doc.push_str(&pages.join("\n\n"));
    doc
}
