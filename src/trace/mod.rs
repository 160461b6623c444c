//! # Trace
//!
//! The span lifecycle and the inline aggregation protocol.
//!
//! A [`Tracer`] starts [`Span`]s, either as local roots or as children of a
//! parent carried in a [`Context`] or received over the wire as a remote
//! [`SpanContext`]. While a request is in flight the owning handler mutates
//! the span (`set_name`, `set_status`, `add_attributes`); ending it with
//! [`Span::end_and_aggregate`] (server side) or [`Span::end_at_client`]
//! (client trailer side) snapshots the span into a [`SpanData`] and hands it
//! to the aggregation engine.
//!
//! The engine walks the [`ExporterRegistry`] and asks every [`Exporter`] for
//! an [`ErrorType`] verdict. `Ok` and `Aggregate` verdicts place a minimized
//! JSON summary on the outbound headers under the `Agg` field; `Aggregate`
//! additionally lets the exporter fold the downstream `Agg` entries already
//! accumulated by callees, which is what builds up a partial call tree purely
//! through header propagation. The remaining verdicts never reach the wire
//! and are handed back to the exporter locally.
mod aggregation;
mod config;
mod context;
mod evicted_hash_map;
mod export;
mod id_generator;
mod span;
mod trace_context;
mod tracer;

pub use config::{Config, DEFAULT_MAX_ATTRIBUTES_PER_SPAN};
pub use context::Context;
pub use evicted_hash_map::EvictedHashMap;
pub use export::{ErrorType, Exporter, ExporterRegistry, NormalSpanData, SpanData, AGG_HEADER};
#[cfg(any(test, feature = "testing"))]
pub use id_generator::IncrementIdGenerator;
pub use id_generator::{IdGenerator, RandomIdGenerator};
pub use span::Span;
pub use trace_context::{SpanContext, SpanId};
pub use tracer::Tracer;

/// The kind of span, distinguishing the side of an RPC it describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpanKind {
    /// The span kind was not specified.
    #[default]
    Unspecified,
    /// The span covers the server side of handling a request.
    Server,
    /// The span covers an outgoing request to a remote service.
    Client,
}

impl From<SpanKind> for i32 {
    fn from(kind: SpanKind) -> Self {
        match kind {
            SpanKind::Unspecified => 0,
            SpanKind::Server => 1,
            SpanKind::Client => 2,
        }
    }
}

/// The status of a [`Span`]. A zero code indicates success.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    /// A status code; zero indicates success.
    pub code: i32,
    /// A developer-facing description of the status.
    pub message: String,
}

impl Status {
    /// Create a new status from a code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Status {
            code,
            message: message.into(),
        }
    }

    /// Returns `true` if the status code indicates success.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}
