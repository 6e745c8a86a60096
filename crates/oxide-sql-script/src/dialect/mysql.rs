//! MySQL dialect: `DELIMITER` client directives.

use std::sync::LazyLock;

use regex::Regex;

use super::{DelimiterChange, DelimiterPolicy};
use crate::lexer::Delimiter;

static DELIMITER_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^DELIMITER[ \t]+(\S+)[ \t]*$").expect("delimiter directive pattern is valid")
});

/// The MySQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlPolicy;

impl MySqlPolicy {
    /// Creates a new MySQL policy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DelimiterPolicy for MySqlPolicy {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn evaluate_line(
        &self,
        buffer: &str,
        _line: &str,
        _current: &Delimiter,
    ) -> Option<DelimiterChange> {
        let captures = DELIMITER_DIRECTIVE.captures(buffer)?;
        Some(DelimiterChange::Directive(Delimiter::new(&captures[1])))
    }

    fn backslash_escapes(&self) -> bool {
        true
    }
}
