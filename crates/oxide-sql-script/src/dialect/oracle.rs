//! Oracle dialect: PL/SQL blocks and alternate quoting.

use std::sync::LazyLock;

use regex::Regex;

use super::{DelimiterChange, DelimiterPolicy};
use crate::lexer::{AlternateQuoting, Delimiter};

/// Anonymous blocks: `BEGIN` or `DECLARE` as a whole word at column zero.
static ANONYMOUS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(?:BEGIN|DECLARE)(?:\W.*)?$").expect("anonymous block pattern is valid")
});

/// Stored program units whose bodies contain semicolons.
static PROGRAM_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:NON)?EDITIONABLE\s+)?(?:FUNCTION|PROCEDURE|PACKAGE|TYPE|TRIGGER)\b",
    )
    .expect("program unit pattern is valid")
});

/// The Oracle dialect.
///
/// PL/SQL blocks end with a `/` on a line of its own, as in SQL*Plus.
#[derive(Debug, Clone, Default)]
pub struct OraclePolicy {
    quoting: AlternateQuoting,
}

impl OraclePolicy {
    /// Creates an Oracle policy accepting any printable non-alphanumeric
    /// alternate-quote delimiter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            quoting: AlternateQuoting::new(),
        }
    }

    /// Replaces the alternate-quoting rules.
    #[must_use]
    pub fn with_quoting(mut self, quoting: AlternateQuoting) -> Self {
        self.quoting = quoting;
        self
    }

    /// Returns the delimiter that terminates PL/SQL blocks.
    #[must_use]
    pub fn block_delimiter() -> Delimiter {
        Delimiter::alone_on_line("/")
    }
}

impl DelimiterPolicy for OraclePolicy {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn evaluate_line(
        &self,
        buffer: &str,
        _line: &str,
        _current: &Delimiter,
    ) -> Option<DelimiterChange> {
        if ANONYMOUS_BLOCK.is_match(buffer) || PROGRAM_UNIT.is_match(buffer) {
            Some(DelimiterChange::Block(Self::block_delimiter()))
        } else {
            None
        }
    }

    fn alternate_quoting(&self) -> Option<&AlternateQuoting> {
        Some(&self.quoting)
    }
}
