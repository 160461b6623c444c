//! SDK Configuration
//!
//! Configuration represents the tracer configuration, overrides can be set
//! for the default attribute limit and the id generator.
use crate::agg_warn;
use crate::trace::{IdGenerator, RandomIdGenerator};
use std::env;
use std::str::FromStr;

/// The default maximum number of attributes retained per span.
pub const DEFAULT_MAX_ATTRIBUTES_PER_SPAN: u32 = 32;

/// Tracer configuration
#[derive(Debug)]
#[non_exhaustive]
pub struct Config {
    /// The max attributes that can be added to a `Span`.
    pub max_attributes_per_span: u32,

    /// The id generator that the tracer should use
    pub id_generator: Box<dyn IdGenerator>,
}

impl Config {
    /// Replace the id generator.
    pub fn with_id_generator<T: IdGenerator + 'static>(mut self, id_generator: T) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    /// Replace the per-span attribute limit.
    pub fn with_max_attributes_per_span(mut self, max_attributes: u32) -> Self {
        self.max_attributes_per_span = max_attributes;
        self
    }
}

impl Default for Config {
    /// Create default tracer configuration.
    fn default() -> Self {
        let mut config = Config {
            max_attributes_per_span: DEFAULT_MAX_ATTRIBUTES_PER_SPAN,
            id_generator: Box::<RandomIdGenerator>::default(),
        };

        if let Ok(count_limit) = env::var("AGGTRACE_SPAN_ATTRIBUTE_COUNT_LIMIT") {
            match u32::from_str(&count_limit) {
                Ok(limit) => config.max_attributes_per_span = limit,
                Err(_) => {
                    agg_warn!(
                        name: "Tracer.Config.InvalidAttributeCountLimit",
                        value = count_limit.as_str()
                    );
                }
            }
        }

        config
    }
}
