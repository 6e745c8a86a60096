//! Script parse errors.

use crate::placeholder::PlaceholderError;

/// Errors that can occur while splitting a script into statements.
///
/// Every variant carries the 1-based line on which the offending construct
/// began, not the line where scanning stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// A `'...'` literal is never closed.
    #[error("Unterminated string literal starting at line {line}")]
    UnterminatedString {
        /// Line of the opening quote.
        line: usize,
    },

    /// A `q'X...X'` literal is never closed.
    #[error("Unterminated alternate-quoted literal starting at line {line} (expected `{close}'`)")]
    UnterminatedAlternateQuote {
        /// Line of the opener.
        line: usize,
        /// The character that would have closed the literal.
        close: char,
    },

    /// A `"..."` or `` `...` `` identifier is never closed.
    #[error("Unterminated quoted identifier starting at line {line}")]
    UnterminatedIdentifier {
        /// Line of the opening quote.
        line: usize,
    },

    /// A `/* ... */` comment is never closed.
    #[error("Unterminated block comment starting at line {line}")]
    UnterminatedBlockComment {
        /// Line of the `/*` marker.
        line: usize,
    },

    /// A procedural block is never terminated by its delimiter line.
    #[error("Unterminated procedural block starting at line {line} (expected a line containing only `{delimiter}`)")]
    UnterminatedBlock {
        /// First line of the block.
        line: usize,
        /// The delimiter that would have ended the block.
        delimiter: String,
    },

    /// The script ends with statement text but no delimiter.
    #[error("Incomplete statement starting at line {line}: missing delimiter `{delimiter}`")]
    IncompleteStatement {
        /// First line of the statement.
        line: usize,
        /// The delimiter in force at end of script.
        delimiter: String,
    },

    /// A placeholder has no configured value.
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),
}

impl ScriptError {
    /// Returns the line on which the offending construct began.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::UnterminatedString { line }
            | Self::UnterminatedAlternateQuote { line, .. }
            | Self::UnterminatedIdentifier { line }
            | Self::UnterminatedBlockComment { line }
            | Self::UnterminatedBlock { line, .. }
            | Self::IncompleteStatement { line, .. } => *line,
            Self::Placeholder(err) => err.line(),
        }
    }
}

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;
