//! Scan state threaded through a script parse.

use crate::dialect::DelimiterChange;
use crate::error::ScriptError;
use crate::lexer::{Comment, Context, Delimiter, Literal};

/// The state of a parse between two scan steps.
///
/// Transitions consume the state and return the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanState {
    /// Delimiter that currently ends statements.
    pub delimiter: Delimiter,
    /// Delimiter restored when a procedural block ends.
    pub base_delimiter: Delimiter,
    /// Lexical context at the current position.
    pub context: Context,
    /// Line on which the current literal or comment opened.
    pub context_line: usize,
    /// First line of the open procedural block, if any.
    pub block_start: Option<usize>,
}

impl ScanState {
    /// Creates the state at the start of a script.
    #[must_use]
    pub fn new(delimiter: Delimiter) -> Self {
        Self {
            base_delimiter: delimiter.clone(),
            delimiter,
            context: Context::Code,
            context_line: 0,
            block_start: None,
        }
    }

    /// Returns true if a procedural block is open.
    #[must_use]
    pub const fn in_block(&self) -> bool {
        self.block_start.is_some()
    }

    /// Moves to `context` after a fragment scanned on `line`.
    #[must_use]
    pub fn advance(mut self, context: Context, line: usize) -> Self {
        if self.context.is_code() && !context.is_code() {
            self.context_line = line;
        }
        self.context = context;
        self
    }

    /// Carries the state over a line break.
    #[must_use]
    pub fn end_line(mut self) -> Self {
        self.context = self.context.end_line();
        self
    }

    /// Applies a delimiter change requested on `line`.
    ///
    /// `statement_line` is the start line of the pending statement, which
    /// becomes the start of a procedural block.
    #[must_use]
    pub fn apply(mut self, change: DelimiterChange, statement_line: usize) -> Self {
        match change {
            DelimiterChange::Block(delimiter) => {
                self.delimiter = delimiter;
                self.block_start = Some(statement_line);
            }
            DelimiterChange::Directive(delimiter) => {
                self.base_delimiter = delimiter.clone();
                self.delimiter = delimiter;
            }
        }
        self
    }

    /// Closes the open procedural block and restores the base delimiter.
    #[must_use]
    pub fn leave_block(mut self) -> Self {
        self.delimiter = self.base_delimiter.clone();
        self.block_start = None;
        self
    }

    /// Returns the error for a construct left open at end of script.
    ///
    /// `pending_line` is the start line of statement text that was never
    /// terminated.
    #[must_use]
    pub fn unterminated(&self, pending_line: Option<usize>) -> Option<ScriptError> {
        let line = self.context_line;
        match self.context {
            Context::Literal(Literal::String) => {
                return Some(ScriptError::UnterminatedString { line });
            }
            Context::Literal(Literal::QuotedIdentifier { .. }) => {
                return Some(ScriptError::UnterminatedIdentifier { line });
            }
            Context::Literal(Literal::AlternateQuoted { close }) => {
                return Some(ScriptError::UnterminatedAlternateQuote { line, close });
            }
            Context::Comment(Comment::Block) => {
                return Some(ScriptError::UnterminatedBlockComment { line });
            }
            Context::Comment(Comment::Line) | Context::Code => {}
        }

        if let Some(line) = self.block_start {
            return Some(ScriptError::UnterminatedBlock {
                line,
                delimiter: self.delimiter.to_string(),
            });
        }

        pending_line.map(|line| ScriptError::IncompleteStatement {
            line,
            delimiter: self.delimiter.to_string(),
        })
    }
}
