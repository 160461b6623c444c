use crate::trace::Span;

/// An execution context that may carry the currently active [`Span`].
///
/// Contexts are explicit values passed through the request path; absence of a
/// span is represented by the `Option` rather than a null-safe span handle,
/// so every call site decides what "no active span" means for it. Cloning a
/// context is cheap; the carried span is shared, not copied.
#[derive(Clone, Debug, Default)]
pub struct Context {
    span: Option<Span>,
}

impl Context {
    /// Create an empty context with no active span.
    pub fn new() -> Self {
        Context::default()
    }

    /// Returns a new context derived from this one with the given span set
    /// as active.
    pub fn with_span(&self, span: Span) -> Self {
        Context { span: Some(span) }
    }

    /// The active span carried by this context, if any.
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// Returns `true` if this context carries an active span.
    pub fn has_active_span(&self) -> bool {
        self.span.is_some()
    }
}
