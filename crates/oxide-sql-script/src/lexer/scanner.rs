//! Fragment scanner implementation.

use super::{AlternateQuoting, Comment, Context, Delimiter, Literal};
use crate::dialect::DelimiterPolicy;

/// How a scanned fragment relates to statement boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Live SQL text.
    Code,
    /// Part of a literal, including its quotes.
    Literal,
    /// Part of a comment, including its markers.
    Comment,
    /// A live delimiter that ends the current statement.
    Delimiter,
}

/// The outcome of a single scan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Context after the fragment.
    pub context: Context,
    /// Length of the fragment in bytes.
    pub len: usize,
    /// Classification of the fragment.
    pub kind: FragmentKind,
}

impl Step {
    const fn new(context: Context, len: usize, kind: FragmentKind) -> Self {
        Self { context, len, kind }
    }
}

/// A scanner that classifies script text fragment by fragment.
///
/// The scanner holds no position of its own: every call to [`Scanner::step`]
/// takes the current context and returns the next one.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    quoting: Option<&'a AlternateQuoting>,
    backslash_escapes: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner using the lexical options of a dialect.
    #[must_use]
    pub fn new(policy: &'a dyn DelimiterPolicy) -> Self {
        Self {
            quoting: policy.alternate_quoting(),
            backslash_escapes: policy.backslash_escapes(),
        }
    }

    /// Creates a scanner without dialect extensions.
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            quoting: None,
            backslash_escapes: false,
        }
    }

    /// Scans one fragment at the start of `rest`.
    ///
    /// `prev` is the character immediately before `rest` on the same line,
    /// used to tell `q'` openers apart from identifiers ending in `q`.
    /// `rest` must not be empty.
    #[must_use]
    pub fn step(
        &self,
        context: Context,
        rest: &str,
        prev: Option<char>,
        delimiter: &Delimiter,
    ) -> Step {
        let mut chars = rest.chars();
        let Some(c) = chars.next() else {
            return Step::new(context, 0, FragmentKind::Code);
        };
        let next = chars.next();

        match context {
            Context::Comment(Comment::Line) => Step::new(context, rest.len(), FragmentKind::Comment),
            Context::Comment(Comment::Block) => {
                if rest.starts_with("*/") {
                    Step::new(Context::Code, 2, FragmentKind::Comment)
                } else {
                    Step::new(context, c.len_utf8(), FragmentKind::Comment)
                }
            }
            Context::Literal(Literal::String) => {
                Self::step_quoted(context, '\'', c, next, self.backslash_escapes)
            }
            Context::Literal(Literal::QuotedIdentifier { quote }) => {
                Self::step_quoted(context, quote, c, next, false)
            }
            Context::Literal(Literal::AlternateQuoted { close }) => {
                if c == close && next == Some('\'') {
                    Step::new(Context::Code, close.len_utf8() + 1, FragmentKind::Literal)
                } else {
                    Step::new(context, c.len_utf8(), FragmentKind::Literal)
                }
            }
            Context::Code => self.step_code(c, rest, prev, delimiter),
        }
    }

    /// Scans a fragment in code context: openers first, then the delimiter.
    fn step_code(&self, c: char, rest: &str, prev: Option<char>, delimiter: &Delimiter) -> Step {
        if rest.starts_with("--") {
            return Step::new(
                Context::Comment(Comment::Line),
                rest.len(),
                FragmentKind::Comment,
            );
        }
        if rest.starts_with("/*") {
            return Step::new(Context::Comment(Comment::Block), 2, FragmentKind::Comment);
        }
        match c {
            '\'' => {
                return Step::new(Context::Literal(Literal::String), 1, FragmentKind::Literal);
            }
            '"' | '`' => {
                return Step::new(
                    Context::Literal(Literal::QuotedIdentifier { quote: c }),
                    1,
                    FragmentKind::Literal,
                );
            }
            _ => {}
        }
        if let Some((len, close)) = self.alternate_opener(rest, prev) {
            return Step::new(
                Context::Literal(Literal::AlternateQuoted { close }),
                len,
                FragmentKind::Literal,
            );
        }
        if delimiter.matches_at(rest) {
            return Step::new(Context::Code, delimiter.len(), FragmentKind::Delimiter);
        }
        Step::new(Context::Code, c.len_utf8(), FragmentKind::Code)
    }

    /// Scans inside a quoted literal where a doubled quote is an escape.
    fn step_quoted(
        context: Context,
        quote: char,
        c: char,
        next: Option<char>,
        backslash_escapes: bool,
    ) -> Step {
        if backslash_escapes && c == '\\' {
            if let Some(escaped) = next {
                return Step::new(context, 1 + escaped.len_utf8(), FragmentKind::Literal);
            }
        }
        if c != quote {
            return Step::new(context, c.len_utf8(), FragmentKind::Literal);
        }
        if next == Some(quote) {
            Step::new(context, quote.len_utf8() * 2, FragmentKind::Literal)
        } else {
            Step::new(Context::Code, quote.len_utf8(), FragmentKind::Literal)
        }
    }

    /// Recognizes `q'X`, `Q'X`, `nq'X` and `NQ'X` openers.
    ///
    /// Returns the opener length and the closing character.
    fn alternate_opener(&self, rest: &str, prev: Option<char>) -> Option<(usize, char)> {
        let quoting = self.quoting?;
        if prev.is_some_and(is_identifier_char) {
            return None;
        }

        let mut chars = rest.chars().peekable();
        let mut len = 0;
        if matches!(chars.peek(), Some('n' | 'N')) {
            chars.next();
            len += 1;
        }
        if !matches!(chars.next(), Some('q' | 'Q')) || chars.next() != Some('\'') {
            return None;
        }
        let open = chars.next()?;
        let close = quoting.closer_for(open)?;
        Some((len + 2 + open.len_utf8(), close))
    }

    /// Scans a complete line and returns the context at its end.
    ///
    /// The returned context still reports an open line comment; call
    /// [`Context::end_line`] to carry it over to the next line.
    #[must_use]
    pub fn scan_line(&self, context: Context, line: &str, delimiter: &Delimiter) -> Context {
        let mut context = context;
        let mut prev = None;
        let mut pos = 0;
        while pos < line.len() {
            let rest = &line[pos..];
            let step = self.step(context, rest, prev, delimiter);
            prev = rest[..step.len].chars().next_back();
            context = step.context;
            pos += step.len;
        }
        context
    }
}

/// Returns true if scanning `text` from code context ends inside an open
/// literal, i.e. the next line would continue that literal.
#[must_use]
pub fn ends_with_open_literal(policy: &dyn DelimiterPolicy, text: &str) -> bool {
    let scanner = Scanner::new(policy);
    let delimiter = policy.default_delimiter();
    text.lines()
        .fold(Context::Code, |context, line| {
            scanner.scan_line(context, line, &delimiter).end_line()
        })
        .is_literal()
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericPolicy, MySqlPolicy, OraclePolicy};

    fn scan(scanner: &Scanner<'_>, input: &str) -> Vec<(FragmentKind, String)> {
        let delimiter = Delimiter::default();
        let mut fragments: Vec<(FragmentKind, String)> = Vec::new();
        let mut context = Context::Code;
        let mut prev = None;
        let mut pos = 0;
        while pos < input.len() {
            let rest = &input[pos..];
            let step = scanner.step(context, rest, prev, &delimiter);
            let text = &rest[..step.len];
            let merge = step.kind != FragmentKind::Delimiter
                && fragments.last().is_some_and(|(kind, _)| *kind == step.kind);
            if merge {
                fragments.last_mut().unwrap().1.push_str(text);
            } else {
                fragments.push((step.kind, text.to_string()));
            }
            prev = text.chars().next_back();
            context = step.context;
            pos += step.len;
        }
        fragments
    }

    fn kinds(scanner: &Scanner<'_>, input: &str) -> Vec<FragmentKind> {
        scan(scanner, input).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn test_plain_code_and_delimiter() {
        assert_eq!(
            scan(&Scanner::plain(), "SELECT 1;"),
            vec![
                (FragmentKind::Code, "SELECT 1".to_string()),
                (FragmentKind::Delimiter, ";".to_string()),
            ]
        );
    }

    #[test]
    fn test_delimiter_inside_string_is_shadowed() {
        assert_eq!(
            kinds(&Scanner::plain(), "SELECT 'a;b';"),
            vec![
                FragmentKind::Code,
                FragmentKind::Literal,
                FragmentKind::Delimiter,
            ]
        );
    }

    #[test]
    fn test_escaped_quote_stays_inside_string() {
        let fragments = scan(&Scanner::plain(), "'it''s;' ;");
        assert_eq!(fragments[0], (FragmentKind::Literal, "'it''s;'".to_string()));
        assert_eq!(fragments.last().unwrap().0, FragmentKind::Delimiter);
    }

    #[test]
    fn test_line_comment_shadows_rest_of_line() {
        assert_eq!(
            kinds(&Scanner::plain(), "SELECT 1 -- done; really"),
            vec![FragmentKind::Code, FragmentKind::Comment]
        );
    }

    #[test]
    fn test_block_comment_shadows_delimiter() {
        assert_eq!(
            kinds(&Scanner::plain(), "SELECT /* ; */ 1;"),
            vec![
                FragmentKind::Code,
                FragmentKind::Comment,
                FragmentKind::Code,
                FragmentKind::Delimiter,
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers() {
        assert_eq!(
            kinds(&Scanner::plain(), "SELECT \"a;\"\"b\", `c;d`;"),
            vec![
                FragmentKind::Code,
                FragmentKind::Literal,
                FragmentKind::Code,
                FragmentKind::Literal,
                FragmentKind::Delimiter,
            ]
        );
    }

    #[test]
    fn test_plain_scanner_ignores_alternate_quotes() {
        // Without alternate quoting, q'[ is an identifier followed by a string.
        let context = Scanner::plain().scan_line(Context::Code, "SELECT q'[a]' x", &Delimiter::default());
        assert_eq!(context, Context::Code);
        let context = Scanner::plain().scan_line(Context::Code, "SELECT q'[a'b]'", &Delimiter::default());
        assert_eq!(context, Context::Literal(Literal::String));
    }

    #[test]
    fn test_alternate_quote_opens_and_closes() {
        let policy = OraclePolicy::new();
        let scanner = Scanner::new(&policy);
        let delimiter = Delimiter::default();
        assert_eq!(
            scanner.scan_line(Context::Code, "SELECT q'[it's]", &delimiter),
            Context::Literal(Literal::AlternateQuoted { close: ']' })
        );
        assert_eq!(
            scanner.scan_line(Context::Code, "SELECT nq'!it's!'", &delimiter),
            Context::Code
        );
    }

    #[test]
    fn test_alternate_quote_requires_word_boundary() {
        let policy = OraclePolicy::new();
        let scanner = Scanner::new(&policy);
        // `seq'...'` is an identifier followed by an ordinary string.
        assert_eq!(
            scanner.scan_line(Context::Code, "SELECT seq'[x]' FROM t", &Delimiter::default()),
            Context::Code
        );
    }

    #[test]
    fn test_backslash_escapes() {
        let mysql = MySqlPolicy::new();
        let delimiter = Delimiter::default();
        assert_eq!(
            Scanner::new(&mysql).scan_line(Context::Code, r"SELECT 'it\'s';", &delimiter),
            Context::Code
        );
        let generic = GenericPolicy;
        assert_eq!(
            Scanner::new(&generic).scan_line(Context::Code, r"SELECT 'it\'s", &delimiter),
            Context::Code
        );
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let scanner = Scanner::plain();
        let delimiter = Delimiter::default();
        let context = scanner.scan_line(Context::Code, "SELECT /* start", &delimiter);
        assert_eq!(context, Context::Comment(Comment::Block));
        let context = scanner.scan_line(context.end_line(), "still; inside */ 1;", &delimiter);
        assert_eq!(context, Context::Code);
    }

    #[test]
    fn test_ends_with_open_literal_plain_strings() {
        let policy = GenericPolicy;
        assert!(!ends_with_open_literal(&policy, "SELECT 'a' FROM t;"));
        assert!(ends_with_open_literal(&policy, "SELECT 'a\nb"));
        assert!(!ends_with_open_literal(&policy, ""));
    }

    #[test]
    fn test_multibyte_characters() {
        assert_eq!(
            kinds(&Scanner::plain(), "SELECT 'é;ü' AS ß;"),
            vec![
                FragmentKind::Code,
                FragmentKind::Literal,
                FragmentKind::Code,
                FragmentKind::Delimiter,
            ]
        );
    }
}
