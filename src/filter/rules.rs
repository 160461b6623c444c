//! Built-in filter rules.

use crate::filter::SpanFilter;
use crate::trace::SpanData;

/// Normal iff the span status carries a zero (success) code.
pub(crate) fn status_code_ok(span: &SpanData, _filter: &SpanFilter) -> bool {
    span.status.is_ok()
}

/// Normal iff the span's duration stays within the allowed deviation of the
/// expected average for its name. Names without a recorded average are
/// treated as normal to avoid false positives on unseen components.
pub(crate) fn latency_within_bounds(span: &SpanData, filter: &SpanFilter) -> bool {
    let Some(avg) = filter.expected_latency(&span.name) else {
        return true;
    };
    let duration = span.duration().as_micros() as f64;
    (duration - avg).abs() <= avg * filter.deviation()
}
