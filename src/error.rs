//! Error taxonomy for the payload engine

use thiserror::Error;

/// Reasons a pasted payload or an uploaded file cannot be turned into an
/// [`EncodedPayload`](crate::EncodedPayload).
///
/// All variants are recoverable: the caller clears whatever it was showing and
/// reports the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing left after trimming
    #[error("No input provided")]
    EmptyInput,

    /// Input starts with `data:` but the header has no `;base64,` section
    #[error("Malformed data URI header")]
    MalformedHeader,

    /// Normalized body is not valid padded base64
    #[error("Invalid Base64 Data")]
    InvalidAlphabet,

    /// Converter was handed a file that is not an image
    #[error("Please upload an image file (got {mime})")]
    UnsupportedFileKind {
        /// Declared MIME type of the rejected file
        mime: String,
    },
}

impl ParseError {
    /// Short status line shown to the user for this error
    pub fn status(&self) -> &'static str {
        match self {
            ParseError::UnsupportedFileKind { .. } => "Please upload an image file",
            _ => "Invalid Base64 Data",
        }
    }

    /// Stable identifier used in log events
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::EmptyInput => "empty_input",
            ParseError::MalformedHeader => "malformed_header",
            ParseError::InvalidAlphabet => "invalid_alphabet",
            ParseError::UnsupportedFileKind { .. } => "unsupported_file_kind",
        }
    }
}
