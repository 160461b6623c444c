//! Fixed-layout binary propagation for non-HTTP transports.
//!
//! The layout is 12 bytes: the 8-byte span id (big-endian) followed by the
//! 4-byte little-endian height. The empty (invalid) context encodes to an
//! empty buffer, and decoding anything that is not exactly the fixed layout
//! yields "no context".

use crate::trace::{SpanContext, SpanId};

/// Encode `sc` into its fixed binary layout. The empty context yields an
/// empty buffer.
pub fn to_bytes(sc: &SpanContext) -> Vec<u8> {
    if *sc == SpanContext::empty() {
        return Vec::new();
    }
    let mut buf = Vec::with_capacity(12);
    buf.extend_from_slice(&sc.span_id().to_bytes());
    buf.extend_from_slice(&sc.height().to_le_bytes());
    buf
}

/// Decode a span context from its fixed binary layout. Empty or malformed
/// input yields `None` rather than an error.
pub fn from_bytes(bytes: &[u8]) -> Option<SpanContext> {
    let (id_bytes, height_bytes) = match bytes {
        [id @ .., h0, h1, h2, h3] if id.len() == 8 => (id, [*h0, *h1, *h2, *h3]),
        _ => return None,
    };
    let mut id = [0u8; 8];
    id.copy_from_slice(id_bytes);
    Some(SpanContext::new(
        SpanId::from_bytes(id),
        u32::from_le_bytes(height_bytes),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let contexts = [
            SpanContext::new(SpanId::from(1), 0),
            SpanContext::new(SpanId::from(0xff00ff00ff00ff), 3),
            SpanContext::new(SpanId::from(u64::MAX), u32::MAX),
        ];
        for sc in contexts {
            assert_eq!(from_bytes(&to_bytes(&sc)), Some(sc));
        }
    }

    #[test]
    fn empty_context_encodes_empty() {
        assert!(to_bytes(&SpanContext::empty()).is_empty());
    }

    #[test]
    fn empty_or_malformed_input_decodes_to_none() {
        assert_eq!(from_bytes(&[]), None);
        assert_eq!(from_bytes(&[0; 11]), None);
        assert_eq!(from_bytes(&[0; 13]), None);
    }

    #[test]
    fn layout_is_fixed() {
        let sc = SpanContext::new(SpanId::from(0x0102030405060708), 2);
        assert_eq!(
            to_bytes(&sc),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 2, 0, 0, 0]
        );
    }
}
