//! Post-assembly checks on the rewritten Markdown.
//!
//! Placeholder rewriting is an exact literal match, so two things can leave
//! an image link pointing at nothing in the output folder:
//!
//! - the image failed to decode and its `![id](id)` was kept on purpose, or
//! - the provider wrote the link in a form the literal match does not cover
//!   (different alt text, a title attribute, …).
//!
//! Neither is an error. This module finds such links so they can be logged
//! and counted; the Markdown itself is never modified here.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// `![alt](target)` or `![alt](target "title")`; captures the target.
static RE_IMAGE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[[^\]]*\]\(\s*<?([^)\s>]*)>?(?:\s+"[^"]*")?\s*\)"#).unwrap());

/// Image-link targets that are neither produced files nor external URLs.
///
/// Targets are returned in order of appearance, once each.
pub fn find_unresolved_image_links<'a, I>(markdown: &str, produced_files: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let produced: HashSet<&str> = produced_files.into_iter().collect();
    let mut seen = HashSet::new();
    let mut unresolved = Vec::new();

    for caps in RE_IMAGE_LINK.captures_iter(markdown) {
        let target = &caps[1];
        if target.is_empty() || is_external(target) || produced.contains(target) {
            continue;
        }
        if seen.insert(target.to_string()) {
            unresolved.push(target.to_string());
        }
    }
    unresolved
}

fn is_external(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewritten_links_are_resolved() {
        let md = "![page1_img1.jpeg](page1_img1.jpeg)";
        assert!(find_unresolved_image_links(md, ["page1_img1.jpeg"]).is_empty());
    }

    #[test]
    fn failed_placeholder_is_reported() {
        let md = "![page1_img1.png](page1_img1.png)\n![img-1.jpeg](img-1.jpeg)";
        assert_eq!(
            find_unresolved_image_links(md, ["page1_img1.png"]),
            vec!["img-1.jpeg".to_string()]
        );
    }

    #[test]
    fn non_literal_syntax_is_reported_once() {
        let md = r#"![figure 1](img-0.jpeg "Figure") and ![other](img-0.jpeg)"#;
        assert_eq!(find_unresolved_image_links(md, []), vec!["img-0.jpeg".to_string()]);
    }

    #[test]
    fn external_urls_and_plain_links_are_ignored() {
        let md = "![logo](https://example.com/logo.png) [not an image](img-0.jpeg) \
                  ![x](data:image/png;base64,AAAA)";
        assert!(find_unresolved_image_links(md, []).is_empty());
    }
}
