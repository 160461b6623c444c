//! B3-style HTTP propagation.

use crate::trace::{SpanContext, SpanId};
use http::{HeaderMap, HeaderName, HeaderValue};

/// Header carrying the parent span id as 16 hex characters (8 bytes,
/// left-padded with zeros).
pub const SPAN_ID_HEADER: HeaderName = HeaderName::from_static("x-b3-spanid");

/// Header carrying the parent height as 8 hex characters (4 bytes,
/// little-endian).
pub const SPAN_HEIGHT_HEADER: HeaderName = HeaderName::from_static("x-b3-spanheight");

/// Extracts span contexts from, and injects them into, HTTP header maps.
///
/// Extraction is forgiving: a missing or malformed span id header means "no
/// context" and the caller starts a root span; a malformed height header
/// alone degrades to height 0 while keeping the parent linkage.
#[derive(Clone, Debug, Default)]
pub struct B3Format {
    _private: (),
}

impl B3Format {
    /// Create a new `B3Format`.
    pub fn new() -> Self {
        B3Format::default()
    }

    /// Extract a span context from inbound request headers.
    pub fn span_context_from_headers(&self, headers: &HeaderMap) -> Option<SpanContext> {
        let raw = headers.get(SPAN_ID_HEADER)?.to_str().ok()?;
        let span_id = parse_span_id(raw)?;
        let height = headers
            .get(SPAN_HEIGHT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_height)
            .unwrap_or(0);
        Some(SpanContext::new(span_id, height))
    }

    /// Inject `sc` into outbound request headers. Invalid contexts inject
    /// nothing.
    pub fn inject_span_context(&self, sc: &SpanContext, headers: &mut HeaderMap) {
        if !sc.is_valid() {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{}", sc.span_id())) {
            headers.insert(SPAN_ID_HEADER, value);
        }
        if let Ok(value) = HeaderValue::from_str(&encode_height(sc.height())) {
            headers.insert(SPAN_HEIGHT_HEADER, value);
        }
    }
}

fn parse_span_id(raw: &str) -> Option<SpanId> {
    // Strict hex only: `from_str_radix` underneath would tolerate a sign.
    if raw.is_empty() || raw.len() > 16 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let span_id = SpanId::from_hex(raw).ok()?;
    if span_id == SpanId::INVALID {
        return None;
    }
    Some(span_id)
}

fn parse_height(raw: &str) -> Option<u32> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut bytes = [0u8; 4];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&raw[2 * i..2 * i + 2], 16).ok()?;
    }
    Some(u32::from_le_bytes(bytes))
}

fn encode_height(height: u32) -> String {
    height
        .to_le_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
