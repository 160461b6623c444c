//! # Aggtrace
//!
//! An in-process distributed-tracing SDK with an inline span-aggregation
//! protocol: instead of shipping every finished span to an out-of-band
//! collector, each service hop summarizes its span directly into the HTTP
//! response (header or trailer) under the `Agg` field. An upstream caller or
//! proxy can then rebuild a partial call tree and apply anomaly filters with
//! no separate collection pipeline in the hot path.
//!
//! The crate provides:
//!
//! * [`trace`] — the span lifecycle, context propagation, the bounded
//!   attribute store, the exporter registry and the end-of-span aggregation
//!   engine.
//! * [`propagation`] — the B3-style HTTP header codec and a fixed-layout
//!   binary codec for non-HTTP transports.
//! * [`filter`] — a rule-based anomaly filter (status-code classification
//!   and latency deviation) that exporters use to produce their verdicts.
//!
//! ## Getting started
//!
//! ```
//! use aggtrace::trace::{Config, Context, SpanKind, Tracer};
//! use http::HeaderMap;
//!
//! let tracer = Tracer::new(Config::default());
//!
//! // Inbound request: start a span, record what happened, then fold the
//! // summary into the outbound response headers.
//! let cx = Context::new();
//! let (_cx, span) = tracer.start_span(&cx, "checkout", SpanKind::Server);
//! span.add_attributes([aggtrace::Key::new("http.status_code").i64(200)]);
//!
//! let mut response_headers = HeaderMap::new();
//! span.end_and_aggregate(&mut response_headers);
//! ```
//!
//! Whether a summary reaches the wire is decided per registered
//! [`trace::Exporter`] through its [`trace::ErrorType`] verdict; see the
//! [`trace`] module docs for the protocol details.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]
#![cfg_attr(test, deny(warnings))]

mod common;
mod internal_logging;

pub mod filter;
pub mod propagation;
pub mod trace;

pub use common::{Key, KeyValue, Value};

#[doc(hidden)]
#[cfg(feature = "internal-logs")]
pub mod _private {
    pub use tracing::{debug, warn};
}
