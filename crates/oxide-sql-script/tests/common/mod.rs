#![allow(dead_code)]

use oxide_sql_script::dialect::{DelimiterPolicy, GenericPolicy, MySqlPolicy, OraclePolicy};
use oxide_sql_script::{PlaceholderReplacer, ScriptError, SqlScript, Statement, NO_PLACEHOLDERS};

pub fn parse_with(source: &str, policy: &dyn DelimiterPolicy) -> Vec<Statement> {
    SqlScript::parse(source, &NO_PLACEHOLDERS, policy)
        .unwrap_or_else(|e| panic!("Failed to parse:\n{source}\nError: {e}"))
        .into_statements()
}

pub fn parse_generic(source: &str) -> Vec<Statement> {
    parse_with(source, &GenericPolicy)
}

pub fn parse_oracle(source: &str) -> Vec<Statement> {
    parse_with(source, &OraclePolicy::new())
}

pub fn parse_mysql(source: &str) -> Vec<Statement> {
    parse_with(source, &MySqlPolicy::new())
}

pub fn parse_err_with(source: &str, policy: &dyn DelimiterPolicy) -> ScriptError {
    SqlScript::parse(source, &NO_PLACEHOLDERS, policy)
        .expect_err(&format!("Expected parse error for:\n{source}"))
}

pub fn parse_replaced(source: &str, replacer: &PlaceholderReplacer) -> Vec<Statement> {
    SqlScript::parse(source, replacer, &OraclePolicy::new())
        .unwrap_or_else(|e| panic!("Failed to parse:\n{source}\nError: {e}"))
        .into_statements()
}

/// Returns `(line_number, sql)` pairs for compact assertions.
pub fn lines_and_sql(statements: &[Statement]) -> Vec<(usize, &str)> {
    statements
        .iter()
        .map(|s| (s.line_number(), s.sql()))
        .collect()
}

/// Asserts that the statement line numbers never decrease.
pub fn assert_monotonic(statements: &[Statement]) {
    for pair in statements.windows(2) {
        assert!(
            pair[0].line_number() <= pair[1].line_number(),
            "Line numbers decrease: {} then {}",
            pair[0].line_number(),
            pair[1].line_number()
        );
    }
}
