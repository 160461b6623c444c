//! End-to-end aggregation scenarios: a simulated two-hop call chain where
//! each hop folds its span summary into the response headers it hands back
//! upstream, with no collector involved.

use aggtrace::filter::SpanFilter;
use aggtrace::propagation::B3Format;
use aggtrace::trace::{
    Config, Context, ErrorType, Exporter, ExporterRegistry, NormalSpanData, SpanData, SpanKind,
    Status, Tracer, AGG_HEADER,
};
use http::HeaderMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Test exporter that returns a fixed verdict and records what it saw.
#[derive(Debug)]
struct TestExporter {
    verdict: ErrorType,
    aggregate_calls: AtomicUsize,
    folded_summaries: Mutex<Vec<NormalSpanData>>,
    local_spans: Mutex<Vec<String>>,
}

impl TestExporter {
    fn new(verdict: ErrorType) -> Arc<Self> {
        Arc::new(TestExporter {
            verdict,
            aggregate_calls: AtomicUsize::new(0),
            folded_summaries: Mutex::new(Vec::new()),
            local_spans: Mutex::new(Vec::new()),
        })
    }
}

impl Exporter for TestExporter {
    fn filter_span(&self, _span: &SpanData) -> ErrorType {
        self.verdict
    }

    fn aggregate_span_from_headers(&self, headers: &HeaderMap) {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        let mut folded = self.folded_summaries.lock().expect("lock poisoned");
        for value in headers.get_all(AGG_HEADER) {
            folded.push(serde_json::from_slice(value.as_bytes()).expect("valid Agg JSON"));
        }
    }

    fn export_span(&self, span: &SpanData) {
        self.local_spans
            .lock()
            .expect("lock poisoned")
            .push(span.name.clone());
    }
}

fn decode_agg(headers: &HeaderMap) -> Vec<NormalSpanData> {
    headers
        .get_all(AGG_HEADER)
        .iter()
        .map(|value| serde_json::from_slice(value.as_bytes()).expect("valid Agg JSON"))
        .collect()
}

#[test]
fn aggregate_verdict_emits_and_folds_once() {
    let exporter = TestExporter::new(ErrorType::Aggregate);
    let tracer = Tracer::new(Config::default());
    tracer.registry().register(exporter.clone());

    let (_cx, span) = tracer.start_span(&Context::new(), "checkout", SpanKind::Server);
    let mut response_headers = HeaderMap::new();
    span.end_and_aggregate(&mut response_headers);

    let entries = decode_agg(&response_headers);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "checkout");
    assert!(
        entries[0].duration.parse::<u64>().is_ok(),
        "duration must be decimal microseconds, got {:?}",
        entries[0].duration
    );

    assert_eq!(exporter.aggregate_calls.load(Ordering::SeqCst), 1);
    let folded = exporter.folded_summaries.lock().unwrap();
    assert_eq!(folded.len(), 1);
    assert_eq!(folded[0], entries[0]);
}

#[test]
fn two_hop_chain_accumulates_summaries_upstream() {
    // Hop B (the callee) emits plain summaries; hop A (the caller) is an
    // aggregation point that folds B's summaries together with its own.
    let exporter_b = TestExporter::new(ErrorType::Ok);
    let registry_b = ExporterRegistry::new();
    registry_b.register(exporter_b.clone());
    let tracer_b = Tracer::with_registry(Config::default(), registry_b);

    let exporter_a = TestExporter::new(ErrorType::Aggregate);
    let tracer_a = Tracer::new(Config::default());
    tracer_a.registry().register(exporter_a.clone());

    let b3 = B3Format::new();

    // Hop A: server span for the inbound request, then a client leg to B.
    let (cx_a, server_span_a) = tracer_a.start_span(&Context::new(), "frontend", SpanKind::Server);
    let (_cx, client_span_a) = tracer_a.start_span(&cx_a, "call-backend", SpanKind::Client);

    let mut request_headers = HeaderMap::new();
    b3.inject_span_context(&client_span_a.span_context(), &mut request_headers);

    // Hop B: extract the remote parent, handle the request, end into the
    // response headers.
    let remote_parent = b3
        .span_context_from_headers(&request_headers)
        .expect("propagated context");
    assert_eq!(remote_parent.height(), 1);

    let (_cx, span_b) = tracer_b.start_span_with_remote_parent(
        &Context::new(),
        "backend",
        remote_parent,
        SpanKind::Server,
    );
    assert_eq!(span_b.span_context().height(), 2);

    let mut response_b = HeaderMap::new();
    span_b.end_and_aggregate(&mut response_b);
    assert_eq!(decode_agg(&response_b).len(), 1);

    // Back at hop A: the client leg ends into its trailers, and the
    // middleware copies the callee's accumulated Agg entries onto A's
    // outbound response before A's own server span ends there.
    let mut client_trailers = HeaderMap::new();
    client_span_a.end_at_client(&mut client_trailers);
    assert_eq!(decode_agg(&client_trailers).len(), 1);

    let mut response_a = HeaderMap::new();
    for value in response_b.get_all(AGG_HEADER) {
        response_a.append(AGG_HEADER, value.clone());
    }
    server_span_a.end_and_aggregate(&mut response_a);

    let entries = decode_agg(&response_a);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "backend");
    assert_eq!(entries[1].name, "frontend");

    // The backend span's parent linkage survived the hop.
    assert_eq!(
        entries[0].parent_id,
        client_span_a.span_context().span_id()
    );

    // The aggregation point folded once per span end: the client-leg fold
    // saw its own summary, the server fold saw the callee's plus its own.
    assert_eq!(exporter_a.aggregate_calls.load(Ordering::SeqCst), 2);
    let folded = exporter_a.folded_summaries.lock().unwrap();
    let folded_names: Vec<_> = folded.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(folded_names, ["call-backend", "backend", "frontend"]);
}

#[test]
fn filter_driven_exporter_keeps_flagged_spans_local() {
    /// Exporter wiring the anomaly filter's classification into verdicts.
    #[derive(Debug)]
    struct FilteringExporter {
        filter: SpanFilter,
        local_spans: Mutex<Vec<String>>,
    }

    impl Exporter for FilteringExporter {
        fn filter_span(&self, span: &SpanData) -> ErrorType {
            self.filter.classify(span)
        }

        fn aggregate_span_from_headers(&self, _headers: &HeaderMap) {}

        fn export_span(&self, span: &SpanData) {
            self.local_spans
                .lock()
                .expect("lock poisoned")
                .push(span.name.clone());
        }
    }

    let filter = SpanFilter::new(0.2);
    let exporter = Arc::new(FilteringExporter {
        filter,
        local_spans: Mutex::new(Vec::new()),
    });
    let tracer = Tracer::new(Config::default());
    tracer.registry().register(exporter.clone());

    // A failed span stays off the wire but reaches the local hook.
    let (_cx, failed) = tracer.start_span(&Context::new(), "payments", SpanKind::Server);
    failed.set_status(Status::new(5, "backend unavailable"));
    let mut headers = HeaderMap::new();
    failed.end_and_aggregate(&mut headers);

    assert!(headers.get(AGG_HEADER).is_none());
    assert_eq!(*exporter.local_spans.lock().unwrap(), vec!["payments"]);

    // A healthy span goes on the wire as usual.
    let (_cx, healthy) = tracer.start_span(&Context::new(), "payments", SpanKind::Server);
    let mut headers = HeaderMap::new();
    healthy.end_and_aggregate(&mut headers);
    assert_eq!(decode_agg(&headers).len(), 1);
}

#[test]
fn unregistered_exporter_no_longer_sees_spans() {
    let exporter = TestExporter::new(ErrorType::Ok);
    let tracer = Tracer::new(Config::default());
    let handle: Arc<dyn Exporter> = exporter.clone();
    tracer.registry().register(handle.clone());
    tracer.registry().unregister(&handle);

    let (_cx, span) = tracer.start_span(&Context::new(), "quiet", SpanKind::Server);
    let mut headers = HeaderMap::new();
    span.end_and_aggregate(&mut headers);

    assert!(headers.get(AGG_HEADER).is_none());
}
