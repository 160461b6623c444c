use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::num::ParseIntError;

/// An 8-byte value which identifies a given span.
///
/// The id is valid if it contains at least one non-zero byte.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// Invalid span id
    pub const INVALID: SpanId = SpanId(0);

    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a span id.
    ///
    /// # Examples
    ///
    /// ```
    /// use aggtrace::trace::SpanId;
    ///
    /// assert!(SpanId::from_hex("42").is_ok());
    /// assert!(SpanId::from_hex("58406520a0066491").is_ok());
    ///
    /// assert!(SpanId::from_hex("not_hex").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u64::from_str_radix(hex, 16).map(SpanId)
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::LowerHex for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

// Span ids travel inside the `Agg` JSON payload as 16-character hex strings.
impl Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:016x}", self.0))
    }
}

impl<'de> Deserialize<'de> for SpanId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        SpanId::from_hex(&hex).map_err(de::Error::custom)
    }
}

/// Immutable portion of a [`Span`] which can be serialized and propagated.
///
/// Identifies a span and its position in the local call chain: `span_id` is
/// the span's own identity and `height` its depth, seeded from the parent (or
/// 0 at a root) and incremented at every hop.
///
/// [`Span`]: crate::trace::Span
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanContext {
    span_id: SpanId,
    height: u32,
}

impl SpanContext {
    /// The empty (invalid) span context.
    pub const fn empty() -> Self {
        SpanContext {
            span_id: SpanId::INVALID,
            height: 0,
        }
    }

    /// Construct a new context from its parts.
    pub const fn new(span_id: SpanId, height: u32) -> Self {
        SpanContext { span_id, height }
    }

    /// The [`SpanId`] for this span context.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// The depth of this span within its local call chain.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if the span id is valid (non-zero).
    pub fn is_valid(&self) -> bool {
        self.span_id != SpanId::INVALID
    }
}

impl Default for SpanContext {
    fn default() -> Self {
        SpanContext::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn span_id_test_data() -> Vec<(SpanId, &'static str, [u8; 8])> {
        vec![
            (SpanId(0), "0000000000000000", [0, 0, 0, 0, 0, 0, 0, 0]),
            (SpanId(42), "000000000000002a", [0, 0, 0, 0, 0, 0, 0, 42]),
            (SpanId(5508496025762705295), "4c721bf33e3caf8f", [76, 114, 27, 243, 62, 60, 175, 143])
        ]
    }

    #[test]
    fn test_span_id() {
        for test_case in span_id_test_data() {
            assert_eq!(format!("{}", test_case.0), test_case.1);
            assert_eq!(format!("{:016x}", test_case.0), test_case.1);
            assert_eq!(test_case.0.to_bytes(), test_case.2);

            assert_eq!(test_case.0, SpanId::from_hex(test_case.1).unwrap());
            assert_eq!(test_case.0, SpanId::from_bytes(test_case.2));
        }
    }

    #[test]
    fn span_id_json_round_trip() {
        for (id, hex, _) in span_id_test_data() {
            let encoded = serde_json::to_string(&id).unwrap();
            assert_eq!(encoded, format!("\"{}\"", hex));
            let decoded: SpanId = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, id);
        }
    }

    #[test]
    fn empty_context_is_invalid() {
        assert!(!SpanContext::empty().is_valid());
        assert!(SpanContext::new(SpanId::from(1), 0).is_valid());
    }
}
