//! Magic-byte signatures and MIME helpers
//!
//! Signatures are matched against the *encoded* form of the payload, so a
//! PNG (`\x89PNG\r\n\x1a\n`) is recognized by its base64 prefix `iVBORw0KGgo`
//! without decoding anything.

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_PNG: &str = "image/png";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// Base64 prefixes of known formats, in match priority order.
///
/// Prefixes are not mutually exclusive in general, so the first match wins and
/// the order must not change.
pub const SIGNATURES: &[(&str, &str)] = &[
    ("JVBERi0", MIME_PDF),
    ("/9j/", "image/jpeg"),
    ("iVBORw0KGgo", MIME_PNG),
    ("R0lGOD", "image/gif"),
    ("UklGR", "image/webp"),
    ("Qk", "image/bmp"),
    ("PHN2Zy", "image/svg+xml"),
    ("PD94b", "image/svg+xml"),
    ("AAABAA", "image/x-icon"),
];

const EXTENSIONS: &[(&str, &str)] = &[
    (MIME_PDF, "pdf"),
    (MIME_PNG, "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/bmp", "bmp"),
    ("image/svg+xml", "svg"),
];

/// Detect the MIME type of a normalized, header-less base64 payload.
///
/// Returns `None` when no signature matches; the caller decides what an
/// unrecognized payload resolves to.
pub fn detect_mime_type(payload: &str) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(prefix, _)| payload.starts_with(prefix))
        .map(|&(_, mime)| mime)
}

/// File extension for a MIME type, `bin` when unknown
pub fn extension_for_mime(mime: &str) -> &'static str {
    EXTENSIONS
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|&(_, ext)| ext)
        .unwrap_or("bin")
}

/// Name offered when saving a decoded payload: `file.pdf` for PDFs,
/// `image.<ext>` for everything else.
pub fn download_name(mime: &str) -> String {
    let base = if mime == MIME_PDF { "file" } else { "image" };
    format!("{}.{}", base, extension_for_mime(mime))
}
