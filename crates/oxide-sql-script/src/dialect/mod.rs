//! SQL dialect support.
//!
//! Databases disagree on where a statement ends. This module provides a
//! trait for the dialect-specific part of statement splitting: the default
//! delimiter, client directives that redefine it, procedural blocks whose
//! internal delimiters must not split them, and lexical extensions such as
//! Oracle's alternate quoting.

mod generic;
mod mysql;
mod oracle;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use generic::GenericPolicy;
pub use mysql::MySqlPolicy;
pub use oracle::OraclePolicy;

use crate::lexer::{AlternateQuoting, Delimiter};

/// A change of the active delimiter requested by a script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelimiterChange {
    /// The pending statement is a procedural block terminated by the given
    /// delimiter. The triggering line is part of the statement and the base
    /// delimiter is restored once the block ends.
    Block(Delimiter),
    /// A client directive (e.g. `DELIMITER $$`) replacing the base
    /// delimiter. The directive line itself is not part of any statement.
    Directive(Delimiter),
}

impl DelimiterChange {
    /// Returns the new delimiter.
    #[must_use]
    pub const fn delimiter(&self) -> &Delimiter {
        match self {
            Self::Block(delimiter) | Self::Directive(delimiter) => delimiter,
        }
    }
}

/// Trait for dialect-specific statement splitting rules.
pub trait DelimiterPolicy: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the delimiter in force at the start of a script.
    fn default_delimiter(&self) -> Delimiter {
        Delimiter::default()
    }

    /// Decides whether a line changes the active delimiter.
    ///
    /// `buffer` is the pending statement text including `line`; when no
    /// statement is pending it is the line exactly as written, leading
    /// whitespace included. It is only called for lines that start outside
    /// any literal or comment while no procedural block is open.
    fn evaluate_line(
        &self,
        _buffer: &str,
        _line: &str,
        _current: &Delimiter,
    ) -> Option<DelimiterChange> {
        None
    }

    /// Returns the alternate-quoting rules, if the dialect has them.
    fn alternate_quoting(&self) -> Option<&AlternateQuoting> {
        None
    }

    /// Returns whether a backslash escapes the next character inside string
    /// literals.
    fn backslash_escapes(&self) -> bool {
        false
    }
}

/// The dialects known by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Fixed `;` delimiter (PostgreSQL, SQLite, H2, ...).
    #[default]
    Generic,
    /// Oracle with PL/SQL blocks and `q'[...]'` literals.
    Oracle,
    /// MySQL with `DELIMITER` directives.
    MySql,
}

impl Dialect {
    /// All known dialects.
    pub const ALL: [Self; 3] = [Self::Generic, Self::Oracle, Self::MySql];

    /// Returns the dialect name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Oracle => "oracle",
            Self::MySql => "mysql",
        }
    }

    /// Returns the splitting policy for this dialect.
    #[must_use]
    pub fn policy(self) -> Box<dyn DelimiterPolicy> {
        match self {
            Self::Generic => Box::new(GenericPolicy),
            Self::Oracle => Box::new(OraclePolicy::new()),
            Self::MySql => Box::new(MySqlPolicy::new()),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown dialect '{0}' (expected one of: generic, oracle, mysql)")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dialect| dialect.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDialect(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("oracle".parse::<Dialect>(), Ok(Dialect::Oracle));
        assert_eq!("MySQL".parse::<Dialect>(), Ok(Dialect::MySql));
        assert_eq!("generic".parse::<Dialect>(), Ok(Dialect::Generic));
        assert_eq!(
            "db2".parse::<Dialect>(),
            Err(UnknownDialect("db2".to_string()))
        );
    }

    #[test]
    fn test_dialect_policy_names() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.policy().name(), dialect.as_str());
        }
    }

    #[test]
    fn test_dialect_serde() {
        assert_eq!(serde_json::to_string(&Dialect::MySql).unwrap(), "\"mysql\"");
        assert_eq!(
            serde_json::from_str::<Dialect>("\"oracle\"").unwrap(),
            Dialect::Oracle
        );
    }

    #[test]
    fn test_change_delimiter_accessor() {
        let change = DelimiterChange::Directive(Delimiter::new("$$"));
        assert_eq!(change.delimiter().token(), "$$");
    }
}
