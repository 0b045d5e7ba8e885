// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment classification from declared metadata.
//!
//! Classification never fails: every descriptor resolves to a best-effort
//! [`ClassifiedAttachment`] with a non-empty MIME type, defaulting to
//! `application/octet-stream` when no signal is available. Detection works
//! from declared metadata only; the bytes are never sniffed.

use magpie_core::{AttachmentDescriptor, ClassifiedAttachment};

/// MIME type assumed for dimensioned media with no other signal.
const IMAGE_DEFAULT_MIME: &str = "image/png";

/// Fallback MIME type when nothing else resolves.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Classify an attachment descriptor.
///
/// MIME resolution precedence: declared type > extension lookup > `image/png`
/// when both dimensions are present > `application/octet-stream`.
///
/// Image detection precedence: declared `image/` prefix > recognized image
/// extension > presence of both width and height.
pub fn classify(desc: &AttachmentDescriptor) -> ClassifiedAttachment {
    let ext = desc.name.as_deref().and_then(extension_of);
    let declared = desc
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let has_dimensions = desc.width.is_some() && desc.height.is_some();

    let mime_type = declared
        .map(str::to_string)
        .or_else(|| ext.and_then(mime_from_extension).map(str::to_string))
        .or_else(|| has_dimensions.then(|| IMAGE_DEFAULT_MIME.to_string()))
        .unwrap_or_else(|| FALLBACK_MIME.to_string());

    let is_image = declared.is_some_and(|m| m.starts_with("image/"))
        || ext.is_some_and(is_image_extension)
        || has_dimensions;

    ClassifiedAttachment {
        is_image,
        mime_type,
        name: desc.name.clone(),
        size: desc.size,
        url: desc.url.clone().filter(|u| !u.trim().is_empty()),
        width: desc.width,
        height: desc.height,
    }
}

/// Whether a classified attachment should have its decoded contents inlined
/// as text.
///
/// Follows the same precedence pattern as image detection: MIME `text/`
/// prefix, then a fixed extension set, with `application/json` and
/// `application/xml` special-cased.
pub fn is_text_like(mime_type: &str, name: Option<&str>) -> bool {
    if mime_type.starts_with("text/") {
        return true;
    }
    if matches!(mime_type, "application/json" | "application/xml") {
        return true;
    }
    name.and_then(extension_of).is_some_and(is_text_extension)
}

/// Lowercased file extension of a name, if any.
fn extension_of(name: &str) -> Option<&str> {
    let ext = name.rsplit_once('.').map(|(_, e)| e)?;
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext)
}

/// Resolve a MIME type by file extension.
fn mime_from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",

        // Audio / video
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",

        // Documents
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "json" => "application/json",
        "xml" => "application/xml",

        _ => return None,
    };
    Some(mime)
}

/// Extensions treated as images regardless of declared type.
fn is_image_extension(ext: &str) -> bool {
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tif" | "tiff" | "heic" | "heif"
            | "avif"
    )
}

/// Extensions whose contents are inlined as text.
fn is_text_extension(ext: &str) -> bool {
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "txt" | "md" | "markdown" | "log" | "csv" | "tsv" | "json" | "xml" | "yaml" | "yml"
            | "toml" | "ini" | "html" | "htm" | "css" | "js" | "ts" | "py" | "sh"
    )
}

/// Render a byte count as a human-readable base-1024 size.
///
/// Values under 10 in a non-byte unit get one decimal place, everything else
/// is rounded to an integer. Negative or non-finite inputs render as
/// `unknown size`.
pub fn format_size(bytes: f64) -> String {
    if !bytes.is_finite() || bytes < 0.0 {
        return "unknown size".to_string();
    }
    if bytes == 0.0 {
        return "0 B".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", value.round() as u64)
    } else if value < 10.0 {
        format!("{value:.1} {}", UNITS[unit])
    } else {
        format!("{} {}", value.round() as u64, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn desc(name: Option<&str>, mime: Option<&str>) -> AttachmentDescriptor {
        AttachmentDescriptor {
            url: Some("https://cdn.example/a".into()),
            name: name.map(str::to_string),
            content_type: mime.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn declared_image_mime_wins_over_extension() {
        let c = classify(&desc(Some("photo.dat"), Some("image/webp")));
        assert!(c.is_image);
        assert_eq!(c.mime_type, "image/webp");
    }

    #[test]
    fn image_extension_without_mime() {
        let c = classify(&desc(Some("photo.JPG"), None));
        assert!(c.is_image);
        assert_eq!(c.mime_type, "image/jpeg");
    }

    #[test]
    fn dimensions_alone_imply_image_default() {
        let d = AttachmentDescriptor {
            url: Some("https://cdn.example/a".into()),
            width: Some(640),
            height: Some(480),
            ..Default::default()
        };
        let c = classify(&d);
        assert!(c.is_image);
        assert_eq!(c.mime_type, "image/png");
    }

    #[test]
    fn single_dimension_is_not_an_image() {
        let d = AttachmentDescriptor {
            width: Some(640),
            ..Default::default()
        };
        let c = classify(&d);
        assert!(!c.is_image);
        assert_eq!(c.mime_type, "application/octet-stream");
    }

    #[test]
    fn unknown_everything_falls_back_to_octet_stream() {
        let c = classify(&desc(Some("blob.xyz"), None));
        assert!(!c.is_image);
        assert_eq!(c.mime_type, "application/octet-stream");
    }

    #[test]
    fn blank_declared_mime_is_ignored() {
        let c = classify(&desc(Some("notes.txt"), Some("  ")));
        assert_eq!(c.mime_type, "text/plain");
    }

    #[test]
    fn blank_url_is_dropped() {
        let d = AttachmentDescriptor {
            url: Some("   ".into()),
            ..Default::default()
        };
        assert!(classify(&d).url.is_none());
    }

    #[test]
    fn text_likeness_by_mime_prefix() {
        assert!(is_text_like("text/x-rust", None));
    }

    #[test]
    fn text_likeness_special_cases_json_and_xml() {
        assert!(is_text_like("application/json", None));
        assert!(is_text_like("application/xml", None));
        assert!(!is_text_like("application/pdf", None));
    }

    #[test]
    fn text_likeness_by_extension() {
        assert!(is_text_like("application/octet-stream", Some("config.toml")));
        assert!(!is_text_like("application/octet-stream", Some("image.png")));
    }

    #[test]
    fn format_size_edge_cases() {
        assert_eq!(format_size(0.0), "0 B");
        assert_eq!(format_size(-1.0), "unknown size");
        assert_eq!(format_size(f64::NAN), "unknown size");
        assert_eq!(format_size(f64::INFINITY), "unknown size");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512.0), "512 B");
        assert_eq!(format_size(2048.0), "2.0 KB");
        assert_eq!(format_size(15.0 * 1024.0), "15 KB");
        assert_eq!(format_size(3.5 * 1024.0 * 1024.0), "3.5 MB");
        assert_eq!(format_size(50.0 * 1024.0 * 1024.0), "50 MB");
        assert_eq!(format_size(2.0 * 1024.0 * 1024.0 * 1024.0), "2.0 GB");
    }

    proptest! {
        /// Any declared `image/...` type classifies as an image, whatever
        /// the filename says.
        #[test]
        fn declared_image_mime_always_classifies_as_image(
            subtype in "[a-z]{1,10}",
            name in proptest::option::of("[a-z]{1,8}\\.[a-z]{1,4}"),
        ) {
            let mime = format!("image/{subtype}");
            let c = classify(&desc(name.as_deref(), Some(&mime)));
            prop_assert!(c.is_image);
            prop_assert_eq!(c.mime_type, mime);
        }

        /// The resolved MIME type is never empty.
        #[test]
        fn mime_type_is_never_empty(
            name in proptest::option::of("[a-zA-Z0-9._-]{0,16}"),
            mime in proptest::option::of("[a-z/+.-]{0,20}"),
        ) {
            let c = classify(&desc(name.as_deref(), mime.as_deref()));
            prop_assert!(!c.mime_type.is_empty());
        }
    }
}
