//! Parsed statements.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single executable statement extracted from a script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    line_number: usize,
    sql: String,
}

impl Statement {
    /// Creates a new statement.
    #[must_use]
    pub fn new(line_number: usize, sql: impl Into<String>) -> Self {
        Self {
            line_number,
            sql: sql.into(),
        }
    }

    /// Returns the 1-based line on which the statement starts.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.line_number
    }

    /// Returns the statement text, without its delimiter.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Consumes the statement and returns its text.
    #[must_use]
    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_accessors() {
        let statement = Statement::new(3, "COMMIT");
        assert_eq!(statement.line_number(), 3);
        assert_eq!(statement.sql(), "COMMIT");
        assert_eq!(statement.to_string(), "COMMIT");
        assert_eq!(statement.into_sql(), "COMMIT");
    }

    #[test]
    fn test_statement_json() {
        let statement = Statement::new(18, "SELECT 1");
        assert_eq!(
            serde_json::to_string(&statement).unwrap(),
            r#"{"line_number":18,"sql":"SELECT 1"}"#
        );
    }
}
