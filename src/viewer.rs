//! Viewer state for front ends that render parsed payloads
//!
//! Parsing is synchronous, but rendering (especially multi-page PDFs) is not.
//! Every submission gets a new [`RenderToken`]; a render result that comes
//! back with anything but the latest token is dropped, so a slow render of an
//! old input never overwrites or clears a newer one.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::decoder::Decoder;
use crate::error::ParseError;
use crate::payload::{EncodedPayload, PayloadKind};

const STATUS_BAD_IMAGE: &str = "Unsupported or invalid image data";
const STATUS_BAD_PDF: &str = "Invalid or unsupported PDF data";

/// Identifies one submission; only the latest one may be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderToken(u64);

/// Work handed to the rendering surface after a successful parse
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub token: RenderToken,
    pub payload: EncodedPayload,
}

/// What the rendering surface reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Image drawn at its natural size
    Image { width: u32, height: u32 },
    /// First PDF page drawn
    Pdf { page_count: u32 },
    /// Payload decoded but is not a valid instance of its format
    Failed,
}

/// Mutable state owned by the UI layer
#[derive(Debug, Default)]
pub struct ViewerState {
    decoder: Decoder,
    active_token: u64,
    current: Option<EncodedPayload>,
    rendered: bool,
    status: String,
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewer using a custom decoder (e.g. a different unknown-signature policy)
    pub fn with_decoder(decoder: Decoder) -> Self {
        Self {
            decoder,
            ..Default::default()
        }
    }

    /// Handle a new value of the input field.
    ///
    /// Blank input just clears the viewer. A parse failure clears it and sets
    /// the status line. On success the payload becomes current and a request
    /// for the rendering surface is returned.
    pub fn submit(&mut self, input: &str) -> Result<RenderRequest, ParseError> {
        let token = self.next_token();

        match self.decoder.parse(input) {
            Ok(payload) => {
                self.current = Some(payload.clone());
                self.rendered = false;
                self.status.clear();
                Ok(RenderRequest { token, payload })
            }
            Err(err) => {
                self.reset();
                if err != ParseError::EmptyInput {
                    self.status = err.status().to_string();
                }
                Err(err)
            }
        }
    }

    /// Apply a render result. Returns `false` when the token is stale and the
    /// result was discarded.
    pub fn complete(&mut self, token: RenderToken, outcome: RenderOutcome) -> bool {
        if token.0 != self.active_token {
            debug!(stale = token.0, active = self.active_token, "discarding stale render result");
            return false;
        }

        let Some(payload) = &self.current else {
            return false;
        };

        match outcome {
            RenderOutcome::Failed => {
                let status = match payload.kind() {
                    PayloadKind::Pdf => STATUS_BAD_PDF,
                    _ => STATUS_BAD_IMAGE,
                };
                self.reset();
                self.status = status.to_string();
            }
            outcome => {
                self.status = info_line(payload, &outcome);
                self.rendered = true;
                info!(target: "telemetry", event = "preview_success", mime_type = payload.mime_type());
            }
        }

        true
    }

    /// Clear everything and invalidate any in-flight render
    pub fn reset(&mut self) {
        self.next_token();
        self.current = None;
        self.rendered = false;
        self.status.clear();
    }

    /// The data URI to put on the clipboard
    pub fn copy_data_url(&self) -> Option<&str> {
        let payload = self.current.as_ref()?;
        info!(target: "telemetry", event = "copy_data_url", mime_type = payload.mime_type());
        Some(payload.canonical_uri())
    }

    /// File name for the save action
    pub fn download_name(&self) -> Option<String> {
        self.current.as_ref().map(EncodedPayload::download_name)
    }

    /// Save the current payload's decoded bytes into `dir`
    pub fn save_current(&self, dir: &Path) -> Result<PathBuf> {
        let payload = self.current.as_ref().ok_or_else(|| anyhow!("Nothing to save"))?;
        let path = payload.save_to(dir)?;
        info!(target: "telemetry", event = "download_file", mime_type = payload.mime_type());
        Ok(path)
    }

    pub fn current(&self) -> Option<&EncodedPayload> {
        self.current.as_ref()
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Status line: an error message, or the info line once rendered
    pub fn status(&self) -> &str {
        &self.status
    }

    fn next_token(&mut self) -> RenderToken {
        self.active_token += 1;
        RenderToken(self.active_token)
    }
}

/// Info line without render details, e.g. `image/png • ~12.5 KB` or
/// `PDF • ~80.2 KB`
pub fn summary_line(payload: &EncodedPayload) -> String {
    let kb = payload.decoded_byte_size() as f64 / 1024.0;
    match payload.kind() {
        PayloadKind::Pdf => format!("PDF • ~{:.1} KB", kb),
        _ => format!("{} • ~{:.1} KB", payload.mime_type(), kb),
    }
}

/// Summary shown under a rendered payload, e.g. `640x480 • ~12.5 KB` or
/// `PDF • 3 pages • ~80.2 KB`
pub fn info_line(payload: &EncodedPayload, outcome: &RenderOutcome) -> String {
    let kb = payload.decoded_byte_size() as f64 / 1024.0;
    match outcome {
        RenderOutcome::Image { width, height } => format!("{}x{} • ~{:.1} KB", width, height, kb),
        RenderOutcome::Pdf { page_count } => {
            let pages = if *page_count == 1 {
                "1 page".to_string()
            } else {
                format!("{} pages", page_count)
            };
            format!("PDF • {} • ~{:.1} KB", pages, kb)
        }
        RenderOutcome::Failed => summary_line(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::UnknownSignaturePolicy;

    const PDF_URI: &str = "data:application/pdf;base64,JVBERi0xLjQ=";

    #[test]
    fn test_submit_and_complete() {
        let mut viewer = ViewerState::new();
        let request = viewer.submit("/9j/").unwrap();
        assert_eq!(request.payload.mime_type(), "image/jpeg");
        assert!(!viewer.is_rendered());

        assert!(viewer.complete(request.token, RenderOutcome::Image { width: 2, height: 3 }));
        assert!(viewer.is_rendered());
        assert_eq!(viewer.status(), "2x3 • ~0.0 KB");
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut viewer = ViewerState::new();
        let first = viewer.submit(PDF_URI).unwrap();
        let second = viewer.submit("/9j/").unwrap();
        assert!(second.token > first.token);

        // Slow PDF render finishes after the second input was issued
        assert!(!viewer.complete(first.token, RenderOutcome::Pdf { page_count: 4 }));
        assert_eq!(viewer.current().unwrap().mime_type(), "image/jpeg");
        assert!(!viewer.is_rendered());

        assert!(viewer.complete(second.token, RenderOutcome::Image { width: 1, height: 1 }));
        assert_eq!(viewer.current().unwrap().mime_type(), "image/jpeg");
    }

    #[test]
    fn test_stale_failure_does_not_clear_newer_success() {
        let mut viewer = ViewerState::new();
        let first = viewer.submit(PDF_URI).unwrap();
        let second = viewer.submit("/9j/").unwrap();
        assert!(viewer.complete(second.token, RenderOutcome::Image { width: 1, height: 1 }));

        assert!(!viewer.complete(first.token, RenderOutcome::Failed));
        assert!(viewer.is_rendered());
        assert!(viewer.current().is_some());
    }

    #[test]
    fn test_reset_invalidates_in_flight_render() {
        let mut viewer = ViewerState::new();
        let request = viewer.submit(PDF_URI).unwrap();
        viewer.reset();

        assert!(!viewer.complete(request.token, RenderOutcome::Pdf { page_count: 1 }));
        assert!(viewer.current().is_none());
        assert_eq!(viewer.status(), "");
    }

    #[test]
    fn test_parse_failure_clears_previous_result() {
        let mut viewer = ViewerState::new();
        let request = viewer.submit("/9j/").unwrap();
        viewer.complete(request.token, RenderOutcome::Image { width: 1, height: 1 });

        let err = viewer.submit("not base64!!").unwrap_err();
        assert_eq!(err, ParseError::InvalidAlphabet);
        assert!(viewer.current().is_none());
        assert!(!viewer.is_rendered());
        assert_eq!(viewer.status(), "Invalid Base64 Data");
    }

    #[test]
    fn test_blank_input_resets_without_status() {
        let mut viewer = ViewerState::new();
        viewer.submit("/9j/").unwrap();
        assert_eq!(viewer.submit("   ").unwrap_err(), ParseError::EmptyInput);
        assert!(viewer.current().is_none());
        assert_eq!(viewer.status(), "");
    }

    #[test]
    fn test_render_failure_messages() {
        let mut viewer = ViewerState::new();
        let request = viewer.submit(PDF_URI).unwrap();
        assert!(viewer.complete(request.token, RenderOutcome::Failed));
        assert_eq!(viewer.status(), "Invalid or unsupported PDF data");
        assert!(viewer.current().is_none());

        let request = viewer.submit("iVBORw0KGgo=").unwrap();
        assert!(viewer.complete(request.token, RenderOutcome::Failed));
        assert_eq!(viewer.status(), "Unsupported or invalid image data");
    }

    #[test]
    fn test_copy_and_download() {
        let mut viewer = ViewerState::new();
        assert_eq!(viewer.copy_data_url(), None);
        assert_eq!(viewer.download_name(), None);

        viewer.submit(" data:application/pdf;charset=utf-8;base64,JVBERi0xLjQ \n").unwrap();
        assert_eq!(viewer.copy_data_url(), Some(PDF_URI));
        assert_eq!(viewer.download_name().as_deref(), Some("file.pdf"));
    }

    #[test]
    fn test_save_current() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = ViewerState::new();
        assert!(viewer.save_current(dir.path()).is_err());

        // Truncated body: re-padded, last symbol carries non-zero low bits
        viewer.submit("data:application/pdf;base64,JVBERi0xLjR").unwrap();
        let path = viewer.save_current(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "file.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_custom_decoder() {
        let decoder = Decoder::new().with_unknown_signature(UnknownSignaturePolicy::OctetStream);
        let mut viewer = ViewerState::with_decoder(decoder);
        let request = viewer.submit("AAAA").unwrap();
        assert_eq!(request.payload.mime_type(), "application/octet-stream");
        assert_eq!(viewer.download_name().as_deref(), Some("image.bin"));
    }

    #[test]
    fn test_info_line() {
        let pdf = EncodedPayload::from_parts("application/pdf", "A".repeat(2048));
        assert_eq!(info_line(&pdf, &RenderOutcome::Pdf { page_count: 1 }), "PDF • 1 page • ~1.5 KB");
        assert_eq!(info_line(&pdf, &RenderOutcome::Pdf { page_count: 3 }), "PDF • 3 pages • ~1.5 KB");
        assert_eq!(summary_line(&pdf), "PDF • ~1.5 KB");

        let png = EncodedPayload::from_parts("image/png", "A".repeat(4096));
        assert_eq!(summary_line(&png), "image/png • ~3.0 KB");
        assert_eq!(info_line(&png, &RenderOutcome::Failed), summary_line(&png));
    }
}
