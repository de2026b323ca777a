//! Payload Decoding
//!
//! Turns data URIs and bare base64 text into raw bytes.

use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use bytes::Bytes;
use regex::Regex;
use thiserror::Error;

pub use pf_core::config::DEFAULT_MEDIA_TYPE;

static DATA_URI_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data:([^;,]+);base64").unwrap());

static BARE_BASE64: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/=\s]+$").unwrap());

/// Padding is stripped before decoding, so the engine must not require it.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Not a data URI")]
    NotADataUri,
    /// Text made only of padding
    #[error("Missing payload")]
    MissingPayload,
    #[error("Invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Bytes recovered from a textual payload, with whatever type it declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub bytes: Bytes,
    pub media_type: Option<String>,
}

/// Check whether text looks like unprefixed base64
pub fn is_bare_base64(text: &str) -> bool {
    BARE_BASE64.is_match(text)
}

/// Decode base64, ignoring whitespace
///
/// Up to two trailing `=` are accepted when they complete a quartet or follow
/// a complete one. Text made only of padding has no payload.
pub fn decode_base64(text: &str) -> DecodeResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let unpadded = compact.trim_end_matches('=');
    let padding = compact.len() - unpadded.len();

    if unpadded.is_empty() {
        return Err(DecodeError::MissingPayload);
    }

    if padding > 2 || (padding > 0 && compact.len() % 4 != 0 && unpadded.len() % 4 != 0) {
        return Err(base64::DecodeError::InvalidPadding.into());
    }

    Ok(LENIENT.decode(unpadded)?)
}

/// Decode a `data:` URI into its bytes and declared media type
///
/// Only the segment between the first and second comma is the payload. A
/// missing or empty payload decodes to no bytes.
pub fn decode_data_uri(uri: &str) -> DecodeResult<DecodedPayload> {
    let uri = uri.trim();
    if !uri.starts_with("data:") {
        return Err(DecodeError::NotADataUri);
    }

    let mut segments = uri.split(',');
    let header = segments.next().unwrap_or_default();
    let payload = segments.next().unwrap_or_default();

    let media_type = DATA_URI_HEADER
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    let bytes = if payload.trim().is_empty() {
        Vec::new()
    } else {
        decode_base64(payload)?
    };

    Ok(DecodedPayload {
        bytes: Bytes::from(bytes),
        media_type,
    })
}

/// Encode bytes as a base64 data URI
pub fn encode_data_uri(bytes: &[u8], media_type: &str) -> String {
    let media_type = if media_type.is_empty() {
        DEFAULT_MEDIA_TYPE
    } else {
        media_type
    };
    format!(
        "data:{};base64,{}",
        media_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
