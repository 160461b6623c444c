//! # Span
//!
//! A `Span` is one recorded unit of work: a request, or one leg of an RPC.
//! It moves through three states: **created** (identity and start time
//! fixed), **recording** (name, status and attributes mutable under the
//! span's lock) and **ended** (snapshot taken and dispatched; later mutation
//! attempts are ignored).
//!
//! Ending happens through [`Span::end_and_aggregate`] on the server side or
//! [`Span::end_at_client`] for response trailers. Both are idempotent: an
//! atomic guard ensures the snapshot-encode-dispatch sequence runs at most
//! once no matter how many code paths attempt to end the span.

use crate::trace::export::ExporterRegistry;
use crate::trace::{aggregation, EvictedHashMap, SpanContext, SpanData, SpanId, SpanKind, Status};
use crate::KeyValue;
use http::HeaderMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime};

/// Single operation within a trace.
///
/// The handle is cheap to clone and may be shared read-only across threads
/// (e.g. a handler and its logging middleware); all mutation goes through the
/// span's internal lock.
#[derive(Clone, Debug)]
pub struct Span {
    inner: Arc<SpanInner>,
}

#[derive(Debug)]
struct SpanInner {
    /// Immutable once the span starts.
    span_context: SpanContext,
    /// Basis for the monotonic-safe duration; wall-clock adjustments while
    /// the span is open cannot produce a negative duration.
    start_instant: Instant,
    /// Protects the recorded contents.
    record: Mutex<SpanRecord>,
    registry: ExporterRegistry,
    ended: AtomicBool,
}

#[derive(Debug)]
struct SpanRecord {
    parent_span_id: SpanId,
    span_kind: SpanKind,
    name: String,
    start_time: SystemTime,
    attributes: EvictedHashMap,
    status: Status,
}

impl Span {
    pub(crate) fn new(
        span_context: SpanContext,
        parent_span_id: SpanId,
        name: String,
        span_kind: SpanKind,
        max_attributes: u32,
        registry: ExporterRegistry,
    ) -> Self {
        Span {
            inner: Arc::new(SpanInner {
                span_context,
                start_instant: Instant::now(),
                record: Mutex::new(SpanRecord {
                    parent_span_id,
                    span_kind,
                    name,
                    start_time: SystemTime::now(),
                    attributes: EvictedHashMap::new(max_attributes),
                    status: Status::default(),
                }),
                registry,
                ended: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the `SpanContext` of the span.
    pub fn span_context(&self) -> SpanContext {
        self.inner.span_context
    }

    /// Returns `true` if the span is still recording, i.e. has not ended.
    pub fn is_recording(&self) -> bool {
        !self.inner.ended.load(Ordering::SeqCst)
    }

    /// Sets the name of the span, if it is still recording.
    pub fn set_name(&self, name: impl Into<String>) {
        self.with_record(|record| record.name = name.into());
    }

    /// Sets the status of the span, if it is still recording.
    pub fn set_status(&self, status: Status) {
        self.with_record(|record| record.status = status);
    }

    /// Sets attributes on the span, if it is still recording.
    ///
    /// Existing attributes whose keys appear in `attributes` are
    /// overwritten. Insertion beyond the configured cap evicts the oldest
    /// retained attribute and counts the drop.
    pub fn add_attributes(&self, attributes: impl IntoIterator<Item = KeyValue>) {
        self.with_record(|record| {
            for attribute in attributes {
                record.attributes.insert(attribute);
            }
        });
    }

    /// Ends the span on the server side, aggregating its summary into the
    /// outbound response headers.
    ///
    /// Idempotent: only the first of any number of end attempts (across any
    /// threads) encodes and dispatches.
    pub fn end_and_aggregate(&self, headers: &mut HeaderMap) {
        self.end_into(headers);
    }

    /// Ends the span as a client span, aggregating its summary into the
    /// response trailers.
    pub fn end_at_client(&self, trailers: &mut HeaderMap) {
        self.end_into(trailers);
    }

    /// Builds a point-in-time snapshot of the span.
    pub fn make_span_data(&self) -> SpanData {
        let end_time = self.monotonic_end_time();
        let record = self
            .inner
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        SpanData {
            span_context: self.inner.span_context,
            parent_span_id: record.parent_span_id,
            span_kind: record.span_kind,
            name: record.name.clone(),
            start_time: record.start_time,
            end_time,
            attributes: record.attributes.clone(),
            status: record.status.clone(),
        }
    }

    fn end_into(&self, headers: &mut HeaderMap) {
        if self.inner.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        let span_data = self.make_span_data();
        let exporters = self.inner.registry.load();
        aggregation::dispatch(&span_data, &exporters, headers);
    }

    /// End time derived from the span's monotonic start, offset from the
    /// recorded wall-clock start time.
    fn monotonic_end_time(&self) -> SystemTime {
        let elapsed = self.inner.start_instant.elapsed();
        let record = self
            .inner
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        record.start_time + elapsed
    }

    fn with_record(&self, f: impl FnOnce(&mut SpanRecord)) {
        if self.inner.ended.load(Ordering::SeqCst) {
            return;
        }
        let mut record = self
            .inner
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut record);
    }
}
