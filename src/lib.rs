//! # b64view
//!
//! Parsing, normalization and format detection for base64 payloads pasted by
//! a user, plus the inverse file-to-data-URI conversion.
//!
//! ## Accepted Input
//!
//! Either a full data URI:
//!
//! ```text
//! data:image/svg+xml;charset=utf-8;base64,PHN2Zy8+
//! ```
//!
//! or a bare base64 body:
//!
//! ```text
//! /9j/4AAQSkZJRgABAQEAYABgAAD/2wBD...
//! ```
//!
//! Bodies are normalized before validation:
//! - whitespace and hard line wraps are stripped
//! - the URL-safe alphabet (`-`, `_`) is translated to `+`, `/`
//! - missing `=` padding is restored
//!
//! ## Format Detection
//!
//! Without a header the MIME type is inferred from the encoded prefix, in
//! order (first match wins):
//! 1. `JVBERi0` → `application/pdf`
//! 2. `/9j/` → `image/jpeg`
//! 3. `iVBORw0KGgo` → `image/png`
//! 4. `R0lGOD` → `image/gif`
//! 5. `UklGR` → `image/webp`
//! 6. `Qk` → `image/bmp`
//! 7. `PHN2Zy` / `PD94b` → `image/svg+xml`
//! 8. `AAABAA` → `image/x-icon`
//!
//! Anything else falls back to [`UnknownSignaturePolicy`] (`image/png` unless
//! configured otherwise).
//!
//! ```
//! let payload = b64view::parse("data:image/png;base64,iVBORw0KGgo").unwrap();
//! assert_eq!(payload.payload(), "iVBORw0KGgo=");
//! assert_eq!(payload.decoded_byte_size(), 8);
//! assert_eq!(b64view::format_human_size(1536), "1.5 KB");
//! ```

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod payload;
pub mod signature;
pub mod viewer;

pub use decoder::{Decoder, DecoderConfig, UnknownSignaturePolicy};
pub use encoder::Encoder;
pub use error::ParseError;
pub use payload::{estimate_decoded_size, format_human_size, EncodedPayload, PayloadKind};
pub use signature::{detect_mime_type, download_name, extension_for_mime};
pub use viewer::{info_line, summary_line, RenderOutcome, RenderRequest, RenderToken, ViewerState};

/// Parse user input with the default decoder
pub fn parse(input: &str) -> Result<EncodedPayload, ParseError> {
    Decoder::new().parse(input)
}

/// Encode image bytes with their declared MIME type
pub fn encode_file(bytes: &[u8], declared_mime: &str) -> Result<EncodedPayload, ParseError> {
    Encoder::new().encode_file(bytes, declared_mime)
}
