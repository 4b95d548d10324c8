//! Canonical encoded payload and size helpers

use anyhow::{Context, Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::signature::{self, MIME_PDF};

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

// Re-padded truncated bodies often end in a symbol with non-zero low bits
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Which rendering surface a payload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// `image/*`, rendered from the data URI directly
    Image,
    /// `application/pdf`, rendered page by page from decoded bytes
    Pdf,
    /// Anything else (only reachable through a declared header or the
    /// octet-stream policy)
    Other,
}

/// A validated base64 payload with its resolved MIME type.
///
/// Values are immutable: every parse produces a fresh one. The body is always
/// standard-alphabet, padded to a multiple of 4 and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    canonical_uri: String,
    mime_type: String,
    payload: String,
    decoded_byte_size: usize,
}

impl EncodedPayload {
    /// Assemble a payload from an already normalized and validated body
    pub(crate) fn from_parts(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let payload = payload.into();
        let canonical_uri = format!("{}{}{}{}", DATA_PREFIX, mime_type, BASE64_MARKER, payload);
        let decoded_byte_size = estimate_decoded_size(&payload);

        Self {
            canonical_uri,
            mime_type,
            payload,
            decoded_byte_size,
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn canonical_uri(&self) -> &str {
        &self.canonical_uri
    }

    /// Lower-cased MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Header-less base64 body
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Exact number of bytes the payload decodes to
    pub fn decoded_byte_size(&self) -> usize {
        self.decoded_byte_size
    }

    pub fn kind(&self) -> PayloadKind {
        if self.mime_type == MIME_PDF {
            PayloadKind::Pdf
        } else if self.mime_type.starts_with("image/") {
            PayloadKind::Image
        } else {
            PayloadKind::Other
        }
    }

    /// Name to save the decoded bytes under
    pub fn download_name(&self) -> String {
        signature::download_name(&self.mime_type)
    }

    /// Decode the payload back into raw bytes.
    ///
    /// Non-zero trailing bits in the last symbol are ignored, so every payload
    /// the decoder accepted decodes to exactly
    /// [`decoded_byte_size`](Self::decoded_byte_size) bytes.
    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        LENIENT_STANDARD
            .decode(&self.payload)
            .with_context(|| format!("Failed to decode {} payload", self.mime_type))
    }

    /// Write the decoded bytes into `dir` under [`download_name`](Self::download_name)
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let bytes = self.decode_bytes()?;
        let path = dir.join(self.download_name());
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write: {}", path.display()))?;
        Ok(path)
    }
}

impl fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_uri)
    }
}

/// Number of bytes a base64 body decodes to: `floor(len * 3 / 4) - padding`.
///
/// Accepts a bare body or a full data URI (everything up to the first comma
/// is skipped). No validation is done, so this is also usable as a live
/// estimate while the user is still typing; degenerate inputs saturate at 0.
pub fn estimate_decoded_size(payload: &str) -> usize {
    let body = match payload.strip_prefix(DATA_PREFIX) {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, body)| body),
        None => payload,
    };

    let padding = body.bytes().rev().take(2).take_while(|&b| b == b'=').count();
    (body.len() * 3 / 4).saturating_sub(padding)
}

/// Format a byte count with the largest base-1024 unit whose value is >= 1.
///
/// Plain bytes are printed as an integer. Other units get two decimals; a
/// non-zero fraction has its trailing zeros trimmed (`1.50` -> `1.5`) while an
/// all-zero fraction is kept (`1.00`).
pub fn format_human_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < SIZE_UNITS.len() && bytes >= 1u64 << (10 * (unit + 1)) {
        unit += 1;
    }

    if unit == 0 {
        return format!("{} {}", bytes, SIZE_UNITS[0]);
    }

    let scaled = bytes as f64 / (1u64 << (10 * unit)) as f64;
    let mut number = format!("{:.2}", scaled);
    if !number.ends_with(".00") {
        while number.ends_with('0') {
            number.pop();
        }
    }

    format!("{} {}", number, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_builds_uri() {
        let payload = EncodedPayload::from_parts("image/png", "iVBORw0KGgo=");
        assert_eq!(payload.canonical_uri(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(payload.to_string(), payload.canonical_uri());
        assert_eq!(payload.decoded_byte_size(), 8);
        assert_eq!(payload.kind(), PayloadKind::Image);
    }

    #[test]
    fn test_kind() {
        assert_eq!(EncodedPayload::from_parts("application/pdf", "JVBERi0=").kind(), PayloadKind::Pdf);
        assert_eq!(EncodedPayload::from_parts("text/plain", "AAAA").kind(), PayloadKind::Other);
    }

    #[test]
    fn test_estimate_padding() {
        assert_eq!(estimate_decoded_size(""), 0);
        assert_eq!(estimate_decoded_size("AAAA"), 3);
        assert_eq!(estimate_decoded_size("AAA="), 2);
        assert_eq!(estimate_decoded_size("AA=="), 1);
        assert_eq!(estimate_decoded_size("AAAAAAAA"), 6);
    }

    #[test]
    fn test_estimate_skips_header() {
        assert_eq!(estimate_decoded_size("data:image/png;base64,AA=="), 1);
    }

    #[test]
    fn test_estimate_degenerate() {
        assert_eq!(estimate_decoded_size("="), 0);
        assert_eq!(estimate_decoded_size("A"), 0);
        assert_eq!(estimate_decoded_size("AAAAA"), 3);
    }

    #[test]
    fn test_format_human_size() {
        assert_eq!(format_human_size(0), "0 Bytes");
        assert_eq!(format_human_size(1), "1 Bytes");
        assert_eq!(format_human_size(1023), "1023 Bytes");
        assert_eq!(format_human_size(1024), "1.00 KB");
        assert_eq!(format_human_size(1536), "1.5 KB");
        assert_eq!(format_human_size(1280), "1.25 KB");
        assert_eq!(format_human_size(1_048_576), "1.00 MB");
        assert_eq!(format_human_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_human_size(1u64 << 40), "1.00 TB");
        assert_eq!(format_human_size(1u64 << 50), "1024.00 TB");
    }

    #[test]
    fn test_decode_bytes() {
        let payload = EncodedPayload::from_parts("image/jpeg", "/9j/");
        assert_eq!(payload.decode_bytes().unwrap(), vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_decode_ignores_trailing_bits() {
        let pdf = EncodedPayload::from_parts("application/pdf", "JVBERi0xLjR=");
        assert_eq!(pdf.decode_bytes().unwrap(), b"%PDF-1.4");

        let short = EncodedPayload::from_parts("image/png", "AB==");
        assert_eq!(short.decode_bytes().unwrap(), vec![0x00]);
        assert_eq!(short.decoded_byte_size(), 1);
    }

    #[test]
    fn test_save_to() {
        let dir = tempfile::tempdir().unwrap();
        let payload = EncodedPayload::from_parts("application/pdf", "JVBERi0xLjQ=");

        let path = payload.save_to(dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), "file.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }
}
