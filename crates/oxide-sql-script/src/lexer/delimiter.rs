//! Statement delimiters.

use std::fmt;

/// The character sequence that ends a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter {
    token: String,
    alone_on_line: bool,
}

impl Delimiter {
    /// Creates a delimiter that may appear anywhere in code.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            alone_on_line: false,
        }
    }

    /// Creates a delimiter that only counts when it is the sole content of a
    /// line starting at column zero (e.g. `/` after a PL/SQL block).
    #[must_use]
    pub fn alone_on_line(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            alone_on_line: true,
        }
    }

    /// Returns the delimiter text.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns true if the delimiter must stand alone on its line.
    #[must_use]
    pub const fn is_alone_on_line(&self) -> bool {
        self.alone_on_line
    }

    /// Returns the delimiter length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.token.len()
    }

    /// Returns true if the delimiter text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    /// Returns true if `rest` starts with this delimiter in the middle of a
    /// line.
    #[must_use]
    pub fn matches_at(&self, rest: &str) -> bool {
        !self.alone_on_line && !self.token.is_empty() && rest.starts_with(self.token.as_str())
    }

    /// Returns true if `line` consists solely of this delimiter, starting at
    /// column zero. Trailing whitespace is allowed.
    #[must_use]
    pub fn terminates_line(&self, line: &str) -> bool {
        self.alone_on_line && line.trim_end() == self.token
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::new(";")
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}
