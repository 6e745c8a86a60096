//! Alternate-quoting rules (`q'[...]'` literals).

use std::collections::BTreeSet;

/// Bracket pairs whose opening character is closed by its partner.
const BRACKET_PAIRS: [(char, char); 4] = [('[', ']'), ('(', ')'), ('{', '}'), ('<', '>')];

/// Which characters may open an alternate-quoted literal and what closes
/// them.
///
/// Bracket openers are always accepted and closed by their partner. Any
/// other opener closes itself; by default every printable character that is
/// not alphanumeric, whitespace or `'` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlternateQuoting {
    delimiters: Option<BTreeSet<char>>,
}

impl AlternateQuoting {
    /// Accepts any printable non-alphanumeric same-character delimiter.
    #[must_use]
    pub const fn new() -> Self {
        Self { delimiters: None }
    }

    /// Restricts same-character delimiters to the given set.
    #[must_use]
    pub fn with_delimiters(delimiters: impl IntoIterator<Item = char>) -> Self {
        Self {
            delimiters: Some(delimiters.into_iter().collect()),
        }
    }

    /// Returns the closing character for an opening character, or `None`
    /// if `open` cannot start an alternate-quoted literal.
    #[must_use]
    pub fn closer_for(&self, open: char) -> Option<char> {
        if let Some(&(_, close)) = BRACKET_PAIRS.iter().find(|(o, _)| *o == open) {
            return Some(close);
        }
        let accepted = match &self.delimiters {
            Some(set) => set.contains(&open),
            None => is_printable_symbol(open),
        };
        accepted.then_some(open)
    }
}

fn is_printable_symbol(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control() && c != '\''
}
