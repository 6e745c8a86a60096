//! Generic SQL dialect.

use super::DelimiterPolicy;

/// A dialect with a fixed `;` delimiter and no procedural blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericPolicy;

impl GenericPolicy {
    /// Creates a new generic policy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DelimiterPolicy for GenericPolicy {
    fn name(&self) -> &'static str {
        "generic"
    }
}
