//! Placeholder substitution.
//!
//! Scripts may reference configured values as `${name}`. Substitution is a
//! plain text pass that runs before the script is lexed, so placeholders are
//! replaced inside literals and comments too.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Errors raised while replacing placeholders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceholderError {
    /// The script references a placeholder without a configured value.
    #[error("No value provided for placeholder '{name}' at line {line}")]
    Unresolved {
        /// The placeholder name, without prefix and suffix.
        name: String,
        /// Line of the reference.
        line: usize,
    },
}

impl PlaceholderError {
    /// Returns the line of the offending reference.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Unresolved { line, .. } => *line,
        }
    }
}

/// Replaces `${name}` references with configured values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderReplacer {
    placeholders: BTreeMap<String, String>,
    prefix: Cow<'static, str>,
    suffix: Cow<'static, str>,
}

/// A replacer that leaves every script untouched.
pub const NO_PLACEHOLDERS: PlaceholderReplacer = PlaceholderReplacer::none();

impl PlaceholderReplacer {
    /// Default placeholder prefix.
    pub const DEFAULT_PREFIX: &'static str = "${";
    /// Default placeholder suffix.
    pub const DEFAULT_SUFFIX: &'static str = "}";

    /// Creates the identity replacer.
    ///
    /// It has no prefix or suffix, so it never looks for references.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            placeholders: BTreeMap::new(),
            prefix: Cow::Borrowed(""),
            suffix: Cow::Borrowed(""),
        }
    }

    /// Creates a replacer for the given name/value pairs.
    ///
    /// References use `${name}`. Any reference without a value fails, even
    /// when no values are given at all.
    #[must_use]
    pub fn new<K, V>(placeholders: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            placeholders: placeholders
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            prefix: Cow::Borrowed(Self::DEFAULT_PREFIX),
            suffix: Cow::Borrowed(Self::DEFAULT_SUFFIX),
        }
    }

    /// Sets the placeholder prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Cow::Owned(prefix.into());
        self
    }

    /// Sets the placeholder suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Cow::Owned(suffix.into());
        self
    }

    /// Returns the configured placeholders.
    #[must_use]
    pub const fn placeholders(&self) -> &BTreeMap<String, String> {
        &self.placeholders
    }

    /// Returns true if this replacer skips placeholder handling entirely.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.prefix.is_empty() || self.suffix.is_empty()
    }

    /// Replaces every placeholder reference in `text`.
    ///
    /// Fails on the first reference whose name has no configured value. The
    /// identity replacer returns `text` unchanged without looking for
    /// references.
    pub fn replace<'t>(&self, text: &'t str) -> Result<Cow<'t, str>, PlaceholderError> {
        if self.is_identity() {
            return Ok(Cow::Borrowed(text));
        }

        let mut replaced = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(self.prefix.as_ref()) {
            let after = &rest[start + self.prefix.len()..];
            let Some(end) = after.find(self.suffix.as_ref()) else {
                break;
            };
            let name = &after[..end];
            let Some(value) = self.placeholders.get(name) else {
                let offset = text.len() - rest.len() + start;
                return Err(PlaceholderError::Unresolved {
                    name: name.to_string(),
                    line: line_at(text, offset),
                });
            };
            replaced.push_str(&rest[..start]);
            replaced.push_str(value);
            rest = &after[end + self.suffix.len()..];
        }
        replaced.push_str(rest);
        Ok(Cow::Owned(replaced))
    }
}

impl Default for PlaceholderReplacer {
    fn default() -> Self {
        Self::none()
    }
}

/// Returns the 1-based line containing byte `offset`.
fn line_at(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}
