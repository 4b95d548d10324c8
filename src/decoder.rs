//! Payload decoder: turns free-form user input into an [`EncodedPayload`]

use tracing::{debug, trace, warn};

use crate::error::ParseError;
use crate::payload::EncodedPayload;
use crate::signature::{self, MIME_OCTET_STREAM, MIME_PNG};

const DATA_PREFIX: &str = "data:";
const BASE64_TOKEN: &str = "base64";

/// What an input with no recognizable signature resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownSignaturePolicy {
    /// Guess the given MIME type (`image/png` by default)
    Assume(String),
    /// Report the payload as `application/octet-stream`
    OctetStream,
}

impl UnknownSignaturePolicy {
    /// Build an `Assume` policy, lower-casing the MIME type.
    ///
    /// The type must be a single header token so the resulting data URI
    /// parses back to the same payload.
    pub fn assume(mime: &str) -> Result<Self, ParseError> {
        let mime = mime.trim();
        if !is_media_type_token(mime) {
            return Err(ParseError::MalformedHeader);
        }
        Ok(UnknownSignaturePolicy::Assume(mime.to_ascii_lowercase()))
    }

    fn resolve(&self) -> String {
        match self {
            UnknownSignaturePolicy::Assume(mime) if is_media_type_token(mime) => mime.to_ascii_lowercase(),
            UnknownSignaturePolicy::Assume(mime) => {
                warn!(mime = %mime, "unusable fallback MIME type, using octet-stream");
                MIME_OCTET_STREAM.to_string()
            }
            UnknownSignaturePolicy::OctetStream => MIME_OCTET_STREAM.to_string(),
        }
    }
}

/// Non-empty, and free of the `;`/`,` delimiters and whitespace
fn is_media_type_token(mime: &str) -> bool {
    !mime.is_empty() && !mime.contains(|c: char| c == ';' || c == ',' || c.is_whitespace())
}

impl Default for UnknownSignaturePolicy {
    fn default() -> Self {
        UnknownSignaturePolicy::Assume(MIME_PNG.to_string())
    }
}

/// Configuration for payload decoding
#[derive(Debug, Clone, Default)]
pub struct DecoderConfig {
    /// Fallback used when signature detection finds nothing
    pub unknown_signature: UnknownSignaturePolicy,
}

/// Where the resolved MIME type came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MimeSource {
    Header,
    Signature,
    Fallback,
}

/// Parses pasted text into a validated payload.
///
/// Stateless apart from its configuration; every call is independent.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with the default `image/png` fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with a custom config
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Set the policy for unrecognized signatures
    pub fn with_unknown_signature(mut self, policy: UnknownSignaturePolicy) -> Self {
        self.config.unknown_signature = policy;
        self
    }

    /// Parse raw user input.
    ///
    /// Accepts either a `data:<mime>[;k=v]*;base64,<body>` URI or a bare body.
    /// The body may be hard-wrapped, URL-safe encoded or missing its padding.
    pub fn parse(&self, input: &str) -> Result<EncodedPayload, ParseError> {
        let result = self.parse_inner(input);
        if let Err(err) = &result {
            debug!(kind = err.kind(), input_len = input.len(), "payload rejected");
        }
        result
    }

    fn parse_inner(&self, input: &str) -> Result<EncodedPayload, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let (header_mime, body) = match trimmed.strip_prefix(DATA_PREFIX) {
            Some(rest) => {
                let (mime, body) = Self::parse_header(rest)?;
                (Some(mime), body)
            }
            None => (None, trimmed),
        };

        let normalized = normalize(body);
        trace!(raw_len = body.len(), normalized_len = normalized.len(), "normalized body");

        if !is_valid_base64(&normalized) {
            return Err(ParseError::InvalidAlphabet);
        }

        let (mime, source) = match header_mime {
            Some(mime) => (mime, MimeSource::Header),
            None => match signature::detect_mime_type(&normalized) {
                Some(mime) => (mime.to_string(), MimeSource::Signature),
                None => (self.config.unknown_signature.resolve(), MimeSource::Fallback),
            },
        };

        let payload = EncodedPayload::from_parts(mime, normalized);
        debug!(
            mime = payload.mime_type(),
            source = ?source,
            bytes = payload.decoded_byte_size(),
            "payload resolved"
        );

        Ok(payload)
    }

    /// Split the part after `data:` into a lower-cased media type and the body.
    ///
    /// Grammar: `<media-type>(;<key>=<value>)*;base64,<body>`, where no token
    /// may contain `;` or `,`. An empty body is allowed (zero-byte file).
    fn parse_header(rest: &str) -> Result<(String, &str), ParseError> {
        let (header, body) = rest.split_once(',').ok_or(ParseError::MalformedHeader)?;

        let mut segments = header.split(';');
        let media_type = segments.next().unwrap_or_default();
        if media_type.is_empty() {
            return Err(ParseError::MalformedHeader);
        }

        let params: Vec<&str> = segments.collect();
        let (marker, params) = params.split_last().ok_or(ParseError::MalformedHeader)?;
        if !marker.eq_ignore_ascii_case(BASE64_TOKEN) {
            return Err(ParseError::MalformedHeader);
        }

        for param in params {
            match param.split_once('=') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {}
                _ => return Err(ParseError::MalformedHeader),
            }
        }

        Ok((media_type.to_ascii_lowercase(), body))
    }
}

/// Strip whitespace, translate the URL-safe alphabet and re-pad to a multiple of 4
pub fn normalize(body: &str) -> String {
    let mut normalized: String = body
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    normalized
}

/// `^[A-Za-z0-9+/]*={0,2}$` with a length that is a multiple of 4
pub fn is_valid_base64(body: &str) -> bool {
    if body.len() % 4 != 0 {
        return false;
    }

    let data = body.trim_end_matches('=');
    if body.len() - data.len() > 2 {
        return false;
    }

    data.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}
