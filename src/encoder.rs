//! File to data URI encoder

use anyhow::{Context, Result};
use base64::Engine;
use std::path::Path;
use tracing::debug;

use crate::error::ParseError;
use crate::payload::EncodedPayload;

/// Encodes raw file bytes into an [`EncodedPayload`].
///
/// Only images are accepted; the declared MIME type is trusted as-is, no
/// signature detection happens on this path.
pub struct Encoder {
    // Currently stateless, but reserved for future options
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {}
    }

    /// Encode `bytes` as `data:<declared_mime>;base64,...`
    pub fn encode_file(&self, bytes: &[u8], declared_mime: &str) -> Result<EncodedPayload, ParseError> {
        let mime = declared_mime.trim().to_ascii_lowercase();
        if !mime.starts_with("image/") {
            debug!(mime = %mime, "converter rejected non-image file");
            return Err(ParseError::UnsupportedFileKind { mime });
        }

        let body = base64::engine::general_purpose::STANDARD.encode(bytes);
        let payload = EncodedPayload::from_parts(mime, body);
        debug_assert_eq!(payload.decoded_byte_size(), bytes.len());

        debug!(mime = payload.mime_type(), bytes = bytes.len(), "file encoded");
        Ok(payload)
    }

    /// Read a file from disk and encode it
    pub fn encode_path(&self, path: &Path, declared_mime: &str) -> Result<EncodedPayload> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let payload = self.encode_file(&bytes, declared_mime)?;
        Ok(payload)
    }

    /// Encode a file and write its data URI to a writer
    pub fn encode_to_writer<W: std::io::Write>(&self, bytes: &[u8], declared_mime: &str, mut writer: W) -> Result<()> {
        let payload = self.encode_file(bytes, declared_mime)?;
        writer.write_all(payload.canonical_uri().as_bytes())?;
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg_bytes() {
        let payload = Encoder::new().encode_file(&[0xFF, 0xD8, 0xFF], "image/jpeg").unwrap();
        assert_eq!(payload.canonical_uri(), "data:image/jpeg;base64,/9j/");
        assert_eq!(payload.decoded_byte_size(), 3);
    }

    #[test]
    fn test_encode_size_matches_input() {
        let encoder = Encoder::new();
        for len in 0..16 {
            let bytes: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let payload = encoder.encode_file(&bytes, "image/png").unwrap();
            assert_eq!(payload.decoded_byte_size(), len);
            assert_eq!(payload.payload().len() % 4, 0);
        }
    }

    #[test]
    fn test_encode_normalizes_declared_mime() {
        let payload = Encoder::new().encode_file(b"GIF89a", " Image/GIF ").unwrap();
        assert_eq!(payload.mime_type(), "image/gif");
        assert!(payload.canonical_uri().starts_with("data:image/gif;base64,R0lGOD"));
    }

    #[test]
    fn test_encode_rejects_non_image() {
        let err = Encoder::new().encode_file(b"%PDF-1.4", "application/pdf").unwrap_err();
        assert_eq!(err, ParseError::UnsupportedFileKind { mime: "application/pdf".into() });

        let err = Encoder::new().encode_file(b"", "").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFileKind { .. }));
    }

    #[test]
    fn test_encode_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let payload = Encoder::new().encode_path(&path, "image/gif").unwrap();
        assert_eq!(payload.canonical_uri(), "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn test_encode_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Encoder::new().encode_path(&dir.path().join("missing.png"), "image/png").unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_encode_to_writer() {
        let mut out = Vec::new();
        Encoder::new().encode_to_writer(&[0xFF, 0xD8, 0xFF], "image/jpeg", &mut out).unwrap();
        assert_eq!(out, b"data:image/jpeg;base64,/9j/");
    }
}
