//! End-of-span aggregation engine.
//!
//! Invoked exactly once per span (the span's end guard sees to that) with the
//! live outbound header/trailer map. Every failure on this path is contained:
//! a misbehaving exporter or an unencodable summary must never fail or block
//! the instrumented request.

use crate::agg_warn;
use crate::trace::{ErrorType, Exporter, NormalSpanData, SpanData, AGG_HEADER};
use http::header::InvalidHeaderValue;
use http::{HeaderMap, HeaderValue};
use std::sync::Arc;
use thiserror::Error;

/// A contained failure while building the wire payload. Logged and swallowed,
/// never surfaced to the request path.
#[derive(Debug, Error)]
pub(crate) enum AggregationError {
    #[error("failed to serialize span summary: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("span summary is not a valid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
}

/// Walk the exporter snapshot and act on each verdict.
///
/// `Ok` and `Aggregate` append the encoded summary under [`AGG_HEADER`];
/// `Aggregate` additionally hands the accumulated header set back to the
/// exporter so it can fold the downstream summaries into its own. The
/// remaining verdicts keep the span off the wire and route it to the
/// exporter's local [`Exporter::export_span`] hook instead.
///
/// There is no conflict resolution across exporters beyond last-writer-wins
/// in header accumulation; filters must be order-independent.
pub(crate) fn dispatch(span_data: &SpanData, exporters: &[Arc<dyn Exporter>], headers: &mut HeaderMap) {
    for exporter in exporters {
        match exporter.filter_span(span_data) {
            ErrorType::Ok => {
                if let Err(err) = append_summary(span_data, headers) {
                    agg_warn!(
                        name: "Aggregation.EncodeFailed",
                        span_name = span_data.name.as_str(),
                        error = err.to_string()
                    );
                    continue;
                }
            }
            ErrorType::Aggregate => {
                if let Err(err) = append_summary(span_data, headers) {
                    agg_warn!(
                        name: "Aggregation.EncodeFailed",
                        span_name = span_data.name.as_str(),
                        error = err.to_string()
                    );
                    continue;
                }
                exporter.aggregate_span_from_headers(headers);
            }
            ErrorType::UserSpec | ErrorType::PerformanceDown | ErrorType::Error => {
                // Intentional noise suppression: these verdicts never leak
                // span contents onto the wire.
                exporter.export_span(span_data);
            }
        }
    }
}

fn append_summary(span_data: &SpanData, headers: &mut HeaderMap) -> Result<(), AggregationError> {
    let summary = NormalSpanData::from(span_data);
    let encoded = serde_json::to_string(&summary)?;
    headers.append(AGG_HEADER, HeaderValue::from_str(&encoded)?);
    Ok(())
}
