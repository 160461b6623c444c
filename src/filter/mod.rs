//! # Anomaly filter
//!
//! A configurable rule chain that judges whether a finished span is normal,
//! used by exporter implementations to produce their [`ErrorType`] verdicts.
//!
//! Rules are evaluated in order with short-circuiting AND: the first rule
//! that reports the span abnormal stops evaluation. Two rules come built in,
//! a status-code check and a latency-deviation check against a
//! caller-supplied table of expected average latencies. The table is updated
//! only explicitly through [`SpanFilter::update_component_latency`]; learning
//! or decay is an external concern.

mod rules;

use crate::trace::{ErrorType, SpanData};
use std::collections::HashMap;

/// A rule judging one span: returns `true` if the span looks normal.
pub type RuleFn = fn(&SpanData, &SpanFilter) -> bool;

/// Judges whether a span is normal according to an ordered rule chain.
#[derive(Clone, Debug)]
pub struct SpanFilter {
    /// Expected average latency per span name, in microseconds.
    avg_latencies: HashMap<String, f64>,
    rules: Vec<RuleFn>,
    /// Allowed fraction of deviation from the expected average.
    deviation: f64,
}

impl SpanFilter {
    /// Create a filter with the built-in status-code and latency rules and
    /// the given deviation fraction.
    pub fn new(deviation: f64) -> Self {
        let mut filter = SpanFilter {
            avg_latencies: HashMap::new(),
            rules: Vec::new(),
            deviation,
        };
        filter.add_rule(rules::status_code_ok);
        filter.add_rule(rules::latency_within_bounds);
        filter
    }

    /// Record the expected average latency for a component, in microseconds.
    pub fn update_component_latency(&mut self, component: impl Into<String>, latency_micros: f64) {
        self.avg_latencies.insert(component.into(), latency_micros);
    }

    /// Append a rule to the chain.
    pub fn add_rule(&mut self, rule: RuleFn) {
        self.rules.push(rule);
    }

    /// Evaluate the rule chain. Returns `true` if every rule judges the span
    /// normal; the first rule that flags it stops evaluation.
    pub fn filter(&self, span: &SpanData) -> bool {
        for rule in &self.rules {
            if !rule(span, self) {
                return false;
            }
        }
        true
    }

    /// Map the built-in rules onto the aggregation verdict: a status-code
    /// failure classifies as [`ErrorType::Error`], a latency deviation as
    /// [`ErrorType::PerformanceDown`], and a span passing both as
    /// [`ErrorType::Ok`].
    ///
    /// User-supplied rules added with [`SpanFilter::add_rule`] take part in
    /// [`SpanFilter::filter`] but not in this mapping; an exporter that wants
    /// them on the verdict path can check `filter` first and classify a
    /// failure as [`ErrorType::UserSpec`].
    pub fn classify(&self, span: &SpanData) -> ErrorType {
        if !rules::status_code_ok(span, self) {
            return ErrorType::Error;
        }
        if !rules::latency_within_bounds(span, self) {
            return ErrorType::PerformanceDown;
        }
        ErrorType::Ok
    }

    pub(crate) fn expected_latency(&self, component: &str) -> Option<f64> {
        self.avg_latencies.get(component).copied()
    }

    pub(crate) fn deviation(&self) -> f64 {
        self.deviation
    }
}
