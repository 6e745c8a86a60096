//! Splitting scripts into statements.
//!
//! [`SqlScript::parse`] runs placeholder substitution, then walks the text
//! line by line. At the start of each line that begins in code context the
//! dialect gets a chance to change the delimiter; the line is then scanned
//! fragment by fragment and live delimiters flush the accumulated text as a
//! [`Statement`].

mod accumulator;
mod state;
mod statement;

use std::borrow::Cow;

use tracing::{debug, trace};

pub use accumulator::StatementAccumulator;
pub use state::ScanState;
pub use statement::Statement;

use crate::dialect::{DelimiterChange, DelimiterPolicy, GenericPolicy};
use crate::error::Result;
use crate::lexer::{FragmentKind, Scanner};
use crate::placeholder::PlaceholderReplacer;

/// A migration script split into statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScript {
    statements: Vec<Statement>,
}

impl SqlScript {
    /// Parses a script using the generic dialect.
    pub fn new(source: &str, replacer: &PlaceholderReplacer) -> Result<Self> {
        Self::parse(source, replacer, &GenericPolicy)
    }

    /// Parses a script using the given dialect.
    ///
    /// Line numbers refer to the text after placeholder substitution.
    pub fn parse(
        source: &str,
        replacer: &PlaceholderReplacer,
        policy: &dyn DelimiterPolicy,
    ) -> Result<Self> {
        let text = replacer.replace(source)?;
        let statements = split_statements(&text, policy)?;
        debug!(
            dialect = policy.name(),
            statements = statements.len(),
            "Parsed SQL script"
        );
        Ok(Self { statements })
    }

    /// Returns the statements in script order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Consumes the script and returns its statements.
    #[must_use]
    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }

    /// Returns the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true if the script contains no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl IntoIterator for SqlScript {
    type Item = Statement;
    type IntoIter = std::vec::IntoIter<Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a> IntoIterator for &'a SqlScript {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

/// Splits already substituted text into statements.
fn split_statements(text: &str, policy: &dyn DelimiterPolicy) -> Result<Vec<Statement>> {
    let scanner = Scanner::new(policy);
    let mut state = ScanState::new(policy.default_delimiter());
    let mut accumulator = StatementAccumulator::new();
    let mut statements = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;

        if state.context.is_code() {
            if state.in_block() {
                if state.delimiter.terminates_line(line) {
                    statements.extend(accumulator.flush_as_statement());
                    state = state.leave_block();
                    continue;
                }
            } else if let Some(change) = policy.evaluate_line(
                &pending_with(&accumulator, line),
                line.trim(),
                &state.delimiter,
            ) {
                trace!(line = line_number, delimiter = %change.delimiter(), "Delimiter changed");
                let consumes_line = matches!(change, DelimiterChange::Directive(_));
                let statement_line = accumulator.start_line().unwrap_or(line_number);
                state = state.apply(change, statement_line);
                if consumes_line {
                    continue;
                }
            }
        }

        let mut prev = None;
        let mut pos = 0;
        while pos < line.len() {
            let rest = &line[pos..];
            let step = scanner.step(state.context, rest, prev, &state.delimiter);
            let fragment = &rest[..step.len];
            state = state.advance(step.context, line_number);

            match step.kind {
                FragmentKind::Delimiter => statements.extend(accumulator.flush_as_statement()),
                FragmentKind::Comment if accumulator.is_blank() => {}
                FragmentKind::Code | FragmentKind::Literal | FragmentKind::Comment => {
                    accumulator.append(fragment, line_number);
                }
            }

            prev = fragment.chars().next_back();
            pos += step.len;
        }

        state = state.end_line();
        accumulator.append_line_break();
    }

    match state.unterminated(accumulator.start_line()) {
        Some(err) => Err(err),
        None => Ok(statements),
    }
}

/// Returns the pending statement text followed by `line`.
fn pending_with<'a>(accumulator: &StatementAccumulator, line: &'a str) -> Cow<'a, str> {
    if accumulator.is_blank() {
        Cow::Borrowed(line)
    } else {
        Cow::Owned(format!("{}{line}", accumulator.buffer()))
    }
}
