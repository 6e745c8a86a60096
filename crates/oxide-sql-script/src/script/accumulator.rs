//! Statement text accumulation.

use super::Statement;

/// Collects the text of the statement being scanned.
///
/// Leading whitespace is dropped; the first fragment with visible content
/// fixes the statement's start line. Everything after that is kept verbatim
/// until the statement is flushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementAccumulator {
    buffer: String,
    start_line: Option<usize>,
}

impl StatementAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: String::new(),
            start_line: None,
        }
    }

    /// Appends a fragment scanned on `line`.
    pub fn append(&mut self, fragment: &str, line: usize) {
        if self.start_line.is_some() {
            self.buffer.push_str(fragment);
            return;
        }
        let visible = fragment.trim_start();
        if !visible.is_empty() {
            self.start_line = Some(line);
            self.buffer.push_str(visible);
        }
    }

    /// Appends a line break, unless no statement has started yet.
    pub fn append_line_break(&mut self) {
        if !self.is_blank() {
            self.buffer.push('\n');
        }
    }

    /// Returns true if no statement text has been collected.
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.start_line.is_none()
    }

    /// Returns the start line of the pending statement.
    #[must_use]
    pub const fn start_line(&self) -> Option<usize> {
        self.start_line
    }

    /// Returns the pending statement text.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Turns the pending text into a statement and resets the accumulator.
    ///
    /// Returns `None` if nothing but whitespace was collected.
    pub fn flush_as_statement(&mut self) -> Option<Statement> {
        let statement = self.start_line.and_then(|line| {
            let sql = self.buffer.trim();
            (!sql.is_empty()).then(|| Statement::new(line, sql))
        });
        self.reset();
        statement
    }

    /// Discards the pending text.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.start_line = None;
    }
}
