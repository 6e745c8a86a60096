//! Lexical context of a scan position.

/// Kind of literal the scanner is inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    /// A single-quoted string literal (`'...'`).
    String,
    /// A quoted identifier (`"..."` or `` `...` ``).
    QuotedIdentifier {
        /// The quote character that closes the identifier.
        quote: char,
    },
    /// An alternate-quoted literal such as `q'[...]'`.
    AlternateQuoted {
        /// The character that, followed by `'`, closes the literal.
        close: char,
    },
}

/// Kind of comment the scanner is inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comment {
    /// `-- ...` up to the end of the line.
    Line,
    /// `/* ... */`, possibly spanning lines.
    Block,
}

/// Where the scanner currently is.
///
/// Literals and comments are mutually exclusive, so a single enum carries
/// both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Context {
    /// Plain SQL text, where delimiters are live.
    #[default]
    Code,
    /// Inside a literal.
    Literal(Literal),
    /// Inside a comment.
    Comment(Comment),
}

impl Context {
    /// Returns true if delimiters are live at this position.
    #[must_use]
    pub const fn is_code(self) -> bool {
        matches!(self, Self::Code)
    }

    /// Returns true if inside any literal.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Returns true if inside any comment.
    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Returns the context that carries over to the next line.
    ///
    /// Line comments close at the end of their line; everything else spans
    /// lines.
    #[must_use]
    pub const fn end_line(self) -> Self {
        match self {
            Self::Comment(Comment::Line) => Self::Code,
            other => other,
        }
    }
}
