//! Image extraction: base64 payloads → named image files.
//!
//! Each decoded image gets a flat, collision-free name
//! `page{page}_img{k}{ext}`, where `k` counts decoded images across the whole
//! document. The counter is threaded through [`extract_page_images`] as a
//! plain value and handed back advanced, so one document's numbering can
//! never leak into another's.
//!
//! A payload that cannot be decoded only costs that image: it is reported as
//! an [`ImageDecodeError`], does not consume a counter value, and its
//! placeholder stays in the Markdown.

use crate::error::{ImageDecodeError, Ocr2MdError};
use crate::ocr::OcrImage;
use crate::output::ImageFile;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension used when an image id carries none.
pub const DEFAULT_IMAGE_EXTENSION: &str = ".png";

/// First counter value of every document.
pub const FIRST_IMAGE_INDEX: usize = 1;

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// An image decoded and named, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub file: ImageFile,
    pub bytes: Vec<u8>,
}

/// The outcome of extracting one page's images.
#[derive(Debug, Clone, Default)]
pub struct PageImages {
    /// Successfully decoded images, in page order.
    pub decoded: Vec<DecodedImage>,
    /// Images that were skipped.
    pub skipped: Vec<ImageDecodeError>,
    /// Counter value for the next page.
    pub next_index: usize,
}

/// Extension of an image id including the leading dot, or `.png`.
///
/// `img-0.jpeg` → `.jpeg`; `figure` → `.png`; `figure.` → `.png`.
pub fn image_extension(id: &str) -> String {
    match Path::new(id).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{ext}"),
        _ => DEFAULT_IMAGE_EXTENSION.to_string(),
    }
}

/// `page{page_num}_img{index}{ext}`.
pub fn image_file_name(page_num: usize, index: usize, original_id: &str) -> String {
    format!("page{page_num}_img{index}{}", image_extension(original_id))
}

/// Decode one image payload.
///
/// A `data:` prefix is stripped up to and including the first comma. ASCII
/// whitespace in the base64 body is ignored and padding is optional.
pub fn decode_image_payload(page_num: usize, image: &OcrImage) -> Result<Vec<u8>, ImageDecodeError> {
    let payload = image
        .image_base64
        .as_deref()
        .ok_or_else(|| ImageDecodeError::MissingPayload {
            page: page_num,
            id: image.id.clone(),
        })?;

    let body = if payload.starts_with("data:") {
        match payload.split_once(',') {
            Some((_, rest)) => rest,
            None => {
                return Err(ImageDecodeError::MalformedDataUri {
                    page: page_num,
                    id: image.id.clone(),
                })
            }
        }
    } else {
        payload
    };

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT_BASE64
        .decode(compact.as_bytes())
        .map_err(|e| ImageDecodeError::InvalidBase64 {
            page: page_num,
            id: image.id.clone(),
            detail: e.to_string(),
        })
}

/// Decode and name every image of a page.
///
/// `next_index` is the counter value the first decoded image receives; the
/// returned [`PageImages::next_index`] is advanced by the number of images
/// actually decoded.
pub fn extract_page_images(page_num: usize, images: &[OcrImage], next_index: usize) -> PageImages {
    let mut out = PageImages {
        next_index,
        ..Default::default()
    };

    for image in images {
        match decode_image_payload(page_num, image) {
            Ok(bytes) => {
                let file_name = image_file_name(page_num, out.next_index, &image.id);
                out.next_index += 1;
                out.decoded.push(DecodedImage {
                    file: ImageFile {
                        page_num,
                        original_id: image.id.clone(),
                        file_name,
                    },
                    bytes,
                });
            }
            Err(e) => out.skipped.push(e),
        }
    }
    out
}

/// Write one decoded image into `dir`, replacing a file left by an earlier attempt.
pub async fn write_image(dir: &Path, image: &DecodedImage) -> Result<PathBuf, Ocr2MdError> {
    let path = dir.join(&image.file.file_name);
    tokio::fs::write(&path, &image.bytes)
        .await
        .map_err(|source| Ocr2MdError::Write {
            path: path.clone(),
            source,
        })?;
    debug!("Saved image {} ({} bytes)", path.display(), image.bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn img(id: &str, payload: &str) -> OcrImage {
        OcrImage::new(id, payload)
    }

    #[test]
    fn extension_from_id() {
        assert_eq!(image_extension("img-0.jpeg"), ".jpeg");
        assert_eq!(image_extension("chart.PNG"), ".PNG");
        assert_eq!(image_extension("figure"), ".png");
        assert_eq!(image_extension("figure."), ".png");
        assert_eq!(image_extension(".hidden"), ".png");
    }

    #[test]
    fn file_name_pattern() {
        assert_eq!(image_file_name(3, 7, "img-2.jpeg"), "page3_img7.jpeg");
        assert_eq!(image_file_name(1, 1, "x"), "page1_img1.png");
    }

    #[test]
    fn decodes_plain_and_data_uri_payloads() {
        let raw = STANDARD.encode(b"\x89PNG fake");
        assert_eq!(decode_image_payload(1, &img("a", &raw)).unwrap(), b"\x89PNG fake");

        let uri = format!("data:image/png;base64,{raw}");
        assert_eq!(decode_image_payload(1, &img("a", &uri)).unwrap(), b"\x89PNG fake");
    }

    #[test]
    fn tolerates_whitespace_and_missing_padding() {
        // "hello" → "aGVsbG8="
        assert_eq!(decode_image_payload(1, &img("a", "aGVs\nbG8")).unwrap(), b"hello");
        assert_eq!(decode_image_payload(1, &img("a", " aGVsbG8= ")).unwrap(), b"hello");
    }

    #[test]
    fn data_uri_without_comma_is_malformed() {
        let err = decode_image_payload(2, &img("img-1.jpeg", "data:image/jpeg;base64")).unwrap_err();
        assert_eq!(
            err,
            ImageDecodeError::MalformedDataUri {
                page: 2,
                id: "img-1.jpeg".into()
            }
        );
    }

    #[test]
    fn missing_payload_is_reported() {
        let image = OcrImage {
            id: "img-0.png".into(),
            ..Default::default()
        };
        let err = decode_image_payload(1, &image).unwrap_err();
        assert!(matches!(err, ImageDecodeError::MissingPayload { page: 1, .. }));
    }

    #[test]
    fn invalid_base64_is_reported() {
        let err = decode_image_payload(1, &img("bad.png", "!!!not base64!!!")).unwrap_err();
        assert!(matches!(err, ImageDecodeError::InvalidBase64 { .. }));
    }

    #[test]
    fn counter_skips_failed_images_and_continues_across_pages() {
        let good = STANDARD.encode(b"img");
        let page1 = [img("img-0.jpeg", &good), img("img-1.jpeg", "%%%"), img("img-2", &good)];
        let first = extract_page_images(1, &page1, FIRST_IMAGE_INDEX);

        let names: Vec<_> = first.decoded.iter().map(|d| d.file.file_name.as_str()).collect();
        assert_eq!(names, vec!["page1_img1.jpeg", "page1_img2.png"]);
        assert_eq!(first.skipped.len(), 1);
        assert_eq!(first.skipped[0].image_id(), "img-1.jpeg");
        assert_eq!(first.next_index, 3);

        let page2 = [img("img-0.jpeg", &good)];
        let second = extract_page_images(2, &page2, first.next_index);
        assert_eq!(second.decoded[0].file.file_name, "page2_img3.jpeg");
        assert_eq!(second.next_index, 4);
    }

    #[test]
    fn page_without_images_keeps_counter() {
        let out = extract_page_images(4, &[], 9);
        assert!(out.decoded.is_empty());
        assert_eq!(out.next_index, 9);
    }

    #[tokio::test]
    async fn write_image_creates_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let image = DecodedImage {
            file: ImageFile {
                page_num: 1,
                original_id: "img-0.png".into(),
                file_name: "page1_img1.png".into(),
            },
            bytes: vec![1, 2, 3],
        };
        let path = write_image(tmp.path(), &image).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
