//! Media Type Module
//!
//! Media types of manifest items are derived from the file extension of the
//! resource path through a fixed lookup table; unrecognized or missing
//! extensions fall back to `application/octet-stream`.

/// The file extension of XHTML content documents
///
/// Resources carrying this extension are eligible for the spine and for the
/// start-of-content structural reference.
pub const XHTML_EXTENSION: &str = ".xhtml";

pub const APPLICATION_EPUB_ZIP: &str = "application/epub+zip";
pub const APPLICATION_NCX: &str = "application/x-dtbncx+xml";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
pub const APPLICATION_OEBPS_PACKAGE_XML: &str = "application/oebps-package+xml";
pub const APPLICATION_XHTML_XML: &str = "application/xhtml+xml";

pub const FONT_OTF: &str = "font/otf";
pub const FONT_TTF: &str = "font/ttf";
pub const FONT_WOFF: &str = "font/woff";
pub const FONT_WOFF2: &str = "font/woff2";

pub const IMAGE_GIF: &str = "image/gif";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_SVG_XML: &str = "image/svg+xml";

pub const TEXT_CSS: &str = "text/css";
pub const TEXT_JAVASCRIPT: &str = "text/javascript";

/// Guess the media type of a resource from its path
///
/// The extension comparison is case-insensitive. Paths without an extension
/// and extensions outside the table map to `application/octet-stream`.
pub fn guess_media_type(path: &str) -> &'static str {
    let extension = match extension_of(path) {
        Some(extension) => extension.to_ascii_lowercase(),
        None => return APPLICATION_OCTET_STREAM,
    };

    match extension.as_str() {
        ".epub" => APPLICATION_EPUB_ZIP,
        ".ncx" => APPLICATION_NCX,
        ".opf" => APPLICATION_OEBPS_PACKAGE_XML,
        ".xhtml" => APPLICATION_XHTML_XML,

        ".otf" => FONT_OTF,
        ".ttf" => FONT_TTF,
        ".woff" => FONT_WOFF,
        ".woff2" => FONT_WOFF2,

        ".gif" => IMAGE_GIF,
        ".jpg" => IMAGE_JPEG,
        ".png" => IMAGE_PNG,
        ".svg" => IMAGE_SVG_XML,

        ".css" => TEXT_CSS,
        ".js" => TEXT_JAVASCRIPT,

        _ => APPLICATION_OCTET_STREAM,
    }
}

/// Returns the extension of the path including the leading dot
fn extension_of(path: &str) -> Option<&str> {
    if path.trim().is_empty() {
        return None;
    }

    path.rfind('.').map(|index| &path[index..])
}
