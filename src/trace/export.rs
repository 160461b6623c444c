use crate::trace::{EvictedHashMap, SpanContext, SpanId, SpanKind, Status};
use http::{HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The HTTP header/trailer field under which span summaries accumulate.
///
/// The field is multi-valued: every hop that emits a summary appends another
/// value, which is how a call chain builds a partial trace with no external
/// collector on the hot path.
pub const AGG_HEADER: HeaderName = HeaderName::from_static("agg");

/// The verdict an [`Exporter`] returns for a finished span.
///
/// Not an error in the exception sense: the verdict is a control signal
/// steering what the aggregation engine does with the span summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorType {
    /// The span is normal; its summary goes on the wire.
    Ok,
    /// The span is normal and this hop is an aggregation point: the summary
    /// goes on the wire and the exporter then folds the downstream summaries
    /// already present in the same header set.
    Aggregate,
    /// Flagged by a user-specified rule; handled exporter-locally only.
    UserSpec,
    /// Flagged as a latency anomaly; handled exporter-locally only.
    PerformanceDown,
    /// Flagged as erroneous; handled exporter-locally only.
    Error,
}

/// A pluggable consumer that classifies and optionally retains span data.
///
/// `filter_span` must be safe for concurrent use and should return quickly;
/// slow work belongs on another thread. The [`SpanData`] it receives must not
/// be relied on for mutation, but copies may be kept.
pub trait Exporter: Send + Sync + fmt::Debug {
    /// Classify a finished span, deciding how the aggregation engine
    /// proceeds.
    fn filter_span(&self, span: &SpanData) -> ErrorType;

    /// Fold the `Agg` summaries accumulated in `headers` (this span's own,
    /// plus any placed there by callees further down the chain) into
    /// whatever aggregate this exporter maintains.
    fn aggregate_span_from_headers(&self, headers: &HeaderMap);

    /// Receive a span whose verdict kept it off the wire, for local handling
    /// such as logging or metrics. The default does nothing.
    fn export_span(&self, span: &SpanData) {
        let _ = span;
    }
}

type ExporterSet = Arc<Vec<Arc<dyn Exporter>>>;

/// A process- or test-scoped set of registered [`Exporter`]s.
///
/// Registration is rare and export-time iteration is frequent, so updates are
/// copy-on-write: writers rebuild the set and publish it as a single new
/// snapshot, and readers clone the current snapshot without ever observing a
/// partial update. Iteration order over a snapshot is unspecified.
///
/// The registry is an explicit owned object; composition roots create one
/// (or use the [`Tracer`]'s) and share the cheaply-clonable handle.
///
/// [`Tracer`]: crate::trace::Tracer
#[derive(Clone, Debug, Default)]
pub struct ExporterRegistry {
    inner: Arc<RwLock<ExporterSet>>,
}

impl ExporterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ExporterRegistry::default()
    }

    /// Adds `exporter` to the set that receives finished spans.
    ///
    /// Binaries should register exporters; libraries shouldn't.
    pub fn register(&self, exporter: Arc<dyn Exporter>) {
        if let Ok(mut current) = self.inner.write() {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(exporter);
            *current = Arc::new(next);
        }
    }

    /// Removes a previously registered exporter, compared by handle
    /// identity.
    pub fn unregister(&self, exporter: &Arc<dyn Exporter>) {
        if let Ok(mut current) = self.inner.write() {
            let next = current
                .iter()
                .filter(|e| !Arc::ptr_eq(e, exporter))
                .cloned()
                .collect();
            *current = Arc::new(next);
        }
    }

    /// The current snapshot of registered exporters.
    pub(crate) fn load(&self) -> ExporterSet {
        self.inner
            .read()
            .map(|current| current.clone())
            .unwrap_or_default()
    }
}

/// All the information collected by a [`Span`] at the point it was ended or
/// snapshotted. Immutable once produced.
///
/// [`Span`]: crate::trace::Span
#[derive(Clone, Debug)]
pub struct SpanData {
    /// The span's identity and chain position.
    pub span_context: SpanContext,
    /// The parent's span id, or [`SpanId::INVALID`] at a root.
    pub parent_span_id: SpanId,
    /// The side of the RPC this span describes.
    pub span_kind: SpanKind,
    /// The span name.
    pub name: String,
    /// The wall clock start time.
    pub start_time: SystemTime,
    /// The wall clock end time, offset from `start_time` by the monotonic
    /// duration of the span.
    pub end_time: SystemTime,
    /// The attributes retained by the span's bounded cache.
    pub attributes: EvictedHashMap,
    /// The span status.
    pub status: Status,
}

impl SpanData {
    /// The span duration. Zero if the end time predates the start time.
    pub fn duration(&self) -> Duration {
        self.end_time
            .duration_since(self.start_time)
            .unwrap_or_default()
    }
}

/// The minimized, wire-oriented projection of a [`SpanData`] — the unit
/// actually placed on the `Agg` header.
///
/// Times travel as decimal strings of microseconds, ids as 16-character hex
/// strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalSpanData {
    /// The span's own id.
    #[serde(rename = "s")]
    pub span_id: SpanId,
    /// The parent span id; all zeros at a root.
    #[serde(rename = "p")]
    pub parent_id: SpanId,
    /// The span kind as its wire integer.
    #[serde(rename = "k")]
    pub kind: i32,
    /// The span name.
    #[serde(rename = "n")]
    pub name: String,
    /// Start time in microseconds since the Unix epoch.
    #[serde(rename = "t")]
    pub start_time: String,
    /// Duration in microseconds.
    #[serde(rename = "d")]
    pub duration: String,
}

impl From<&SpanData> for NormalSpanData {
    fn from(data: &SpanData) -> Self {
        let start_micros = data
            .start_time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros();
        NormalSpanData {
            span_id: data.span_context.span_id(),
            parent_id: data.parent_span_id,
            kind: data.span_kind.into(),
            name: data.name.clone(),
            start_time: start_micros.to_string(),
            duration: data.duration().as_micros().to_string(),
        }
    }
}
