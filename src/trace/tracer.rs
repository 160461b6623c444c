use crate::trace::export::ExporterRegistry;
use crate::trace::{Config, Context, Span, SpanContext, SpanId, SpanKind};

/// Starts spans and wires them to an exporter registry.
///
/// There is no hidden process-wide state: a composition root constructs one
/// `Tracer` (optionally sharing an existing [`ExporterRegistry`]) and passes
/// it to whatever instruments the request path.
#[derive(Debug)]
pub struct Tracer {
    config: Config,
    registry: ExporterRegistry,
}

impl Tracer {
    /// Create a tracer with its own empty exporter registry.
    pub fn new(config: Config) -> Self {
        Tracer {
            config,
            registry: ExporterRegistry::new(),
        }
    }

    /// Create a tracer that dispatches to an existing registry.
    pub fn with_registry(config: Config, registry: ExporterRegistry) -> Self {
        Tracer { config, registry }
    }

    /// The registry this tracer's spans dispatch to on end.
    pub fn registry(&self) -> &ExporterRegistry {
        &self.registry
    }

    /// Starts a new `Span`, as a child of the span carried by `cx` if there
    /// is one, else as a root.
    ///
    /// A child derives its height from the parent (parent height + 1,
    /// saturating at `u32::MAX` since heights can arrive over the wire) and
    /// records the parent's span id; a root starts at height 0 with an
    /// invalid parent id. Returns the derived context alongside the span.
    pub fn start_span(
        &self,
        cx: &Context,
        name: impl Into<String>,
        span_kind: SpanKind,
    ) -> (Context, Span) {
        let parent = cx.span().map(|parent| parent.span_context());
        self.start_span_internal(cx, name.into(), parent, span_kind)
    }

    /// Starts a new `Span` whose parent arrived over the wire.
    ///
    /// The remote `parent` is always treated as present, regardless of what
    /// the local context carries; this is the server-side entry point after
    /// extracting a propagated span context from inbound headers.
    pub fn start_span_with_remote_parent(
        &self,
        cx: &Context,
        name: impl Into<String>,
        parent: SpanContext,
        span_kind: SpanKind,
    ) -> (Context, Span) {
        self.start_span_internal(cx, name.into(), Some(parent), span_kind)
    }

    fn start_span_internal(
        &self,
        cx: &Context,
        name: String,
        parent: Option<SpanContext>,
        span_kind: SpanKind,
    ) -> (Context, Span) {
        let span_id = self.config.id_generator.new_span_id();
        let (height, parent_span_id) = match parent {
            Some(parent) => (parent.height().saturating_add(1), parent.span_id()),
            None => (0, SpanId::INVALID),
        };

        let span = Span::new(
            SpanContext::new(span_id, height),
            parent_span_id,
            name,
            span_kind,
            self.config.max_attributes_per_span,
            self.registry.clone(),
        );
        (cx.with_span(span.clone()), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::IncrementIdGenerator;

    fn test_tracer() -> Tracer {
        Tracer::new(Config::default().with_id_generator(IncrementIdGenerator::new()))
    }

    #[test]
    fn root_span_starts_at_height_zero() {
        let tracer = test_tracer();
        let (_cx, span) = tracer.start_span(&Context::new(), "root", SpanKind::Server);

        assert_eq!(span.span_context().height(), 0);
        assert_eq!(span.make_span_data().parent_span_id, SpanId::INVALID);
    }

    #[test]
    fn child_span_derives_height_and_parent() {
        let tracer = test_tracer();
        let (cx, root) = tracer.start_span(&Context::new(), "root", SpanKind::Server);
        let (cx, child) = tracer.start_span(&cx, "child", SpanKind::Client);
        let (_cx, grandchild) = tracer.start_span(&cx, "grandchild", SpanKind::Client);

        assert_eq!(child.span_context().height(), 1);
        assert_eq!(
            child.make_span_data().parent_span_id,
            root.span_context().span_id()
        );
        assert_eq!(grandchild.span_context().height(), 2);
        assert_eq!(
            grandchild.make_span_data().parent_span_id,
            child.span_context().span_id()
        );
    }

    #[test]
    fn remote_parent_wins_over_local_context() {
        let tracer = test_tracer();
        let (cx, _local) = tracer.start_span(&Context::new(), "local", SpanKind::Server);

        let remote = SpanContext::new(SpanId::from(0xabcd), 3);
        let (_cx, span) =
            tracer.start_span_with_remote_parent(&cx, "handler", remote, SpanKind::Server);

        assert_eq!(span.span_context().height(), 4);
        assert_eq!(span.make_span_data().parent_span_id, SpanId::from(0xabcd));
    }

    #[test]
    fn max_height_parent_saturates() {
        // Heights arrive over the wire; a hostile or corrupted header can
        // claim u32::MAX and the child must not wrap back to a root height.
        let tracer = test_tracer();
        let remote = SpanContext::new(SpanId::from(1), u32::MAX);
        let (_cx, span) =
            tracer.start_span_with_remote_parent(&Context::new(), "deep", remote, SpanKind::Server);

        assert_eq!(span.span_context().height(), u32::MAX);
        assert_eq!(span.make_span_data().parent_span_id, SpanId::from(1));
    }

    #[test]
    fn derived_context_carries_the_new_span() {
        let tracer = test_tracer();
        let (cx, span) = tracer.start_span(&Context::new(), "root", SpanKind::Server);

        assert!(cx.has_active_span());
        assert_eq!(
            cx.span().map(|s| s.span_context()),
            Some(span.span_context())
        );
    }
}
