//! # Propagation
//!
//! Codecs for carrying a [`SpanContext`] across process boundaries: a
//! B3-style HTTP header format for HTTP transports and a fixed-layout binary
//! format for everything else.
//!
//! Both directions are lossy-tolerant by design: an absent or unparseable
//! carrier yields "no context" (the receiver starts a root span) rather than
//! an error, so a malformed remote peer can never fail the request path.
//!
//! [`SpanContext`]: crate::trace::SpanContext

pub mod b3;
pub mod binary;

pub use b3::B3Format;
