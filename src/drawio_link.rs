use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::debug;

use crate::config::DiagramConfig;
use crate::error::SerializationError;

/// Characters JavaScript's `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encode diagram XML the way Draw.io stores compressed diagrams:
/// URI-component escape, raw deflate, then standard base64.
pub fn encode_payload(xml: &str) -> Result<String, SerializationError> {
    let escaped = utf8_percent_encode(xml, URI_COMPONENT).to_string();
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(escaped.as_bytes())
        .map_err(|e| SerializationError::Write(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| SerializationError::Write(e.to_string()))?;
    Ok(STANDARD.encode(compressed))
}

/// Inverse of [`encode_payload`]. Accepts the payload as it appears in a
/// viewer URL fragment (percent-encoded) as well as raw base64.
pub fn decode_payload(payload: &str) -> Result<String, SerializationError> {
    let unescaped = percent_decode_str(payload.trim())
        .decode_utf8()
        .map_err(|e| SerializationError::Payload(e.to_string()))?;
    let compact: String = unescaped.chars().filter(|c| !c.is_whitespace()).collect();
    let compressed = STANDARD
        .decode(compact)
        .map_err(|e| SerializationError::Payload(e.to_string()))?;

    let mut inflated = Vec::new();
    DeflateDecoder::new(&compressed[..])
        .read_to_end(&mut inflated)
        .map_err(|e| SerializationError::Payload(e.to_string()))?;
    let inflated = std::str::from_utf8(&inflated)
        .map_err(|e| SerializationError::Payload(e.to_string()))?;

    percent_decode_str(inflated)
        .decode_utf8()
        .map(|xml| xml.into_owned())
        .map_err(|e| SerializationError::Payload(e.to_string()))
}

/// Build a Draw.io viewer link that opens `xml` directly (`#R` fragment).
pub fn viewer_url(xml: &str, config: &DiagramConfig) -> Result<String, SerializationError> {
    let payload = encode_payload(xml)?;
    debug!(xml_bytes = xml.len(), payload_bytes = payload.len(), "encoded drawio payload");
    Ok(format!(
        "{}#R{}",
        config.viewer_base_url,
        utf8_percent_encode(&payload, NON_ALPHANUMERIC)
    ))
}

/// Extract the encoded diagram from a viewer link, if it carries one.
pub fn payload_from_url(url: &str) -> Option<&str> {
    url.split_once("#R").map(|(_, payload)| payload)
}
