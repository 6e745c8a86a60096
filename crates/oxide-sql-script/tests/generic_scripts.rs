//! Tests for splitting scripts with the generic and MySQL dialects.

mod common;
use common::*;

use oxide_sql_script::dialect::{Dialect, GenericPolicy, MySqlPolicy};
use oxide_sql_script::{ScriptError, SqlScript, NO_PLACEHOLDERS};

const GENERIC_INIT: &str = include_str!("fixtures/generic/V1__init.sql");
const MYSQL_PROCEDURES: &str = include_str!("fixtures/mysql/V1__procedures.sql");

#[test]
fn generic_fixture() {
    let statements = parse_generic(GENERIC_INIT);
    assert_eq!(
        lines_and_sql(&statements),
        vec![
            (
                3,
                "CREATE TABLE users (\n    id INTEGER PRIMARY KEY,\n    name TEXT NOT NULL DEFAULT 'anonymous; really'\n)"
            ),
            (
                10,
                "INSERT INTO users (id, name) VALUES (1, 'O''Brien'), (2, \"quoted;name\")"
            ),
            (12, "CREATE INDEX idx_users_name ON users (name)"),
            (12, "CREATE INDEX idx_users_id ON users (id)"),
        ]
    );
}

#[test]
fn generic_ignores_plsql_blocks() {
    // Without the Oracle policy, BEGIN is just a word and `;` splits.
    let statements = parse_generic("BEGIN;\nSELECT 1;\nCOMMIT;\n");
    assert_eq!(
        lines_and_sql(&statements),
        vec![(1, "BEGIN"), (2, "SELECT 1"), (3, "COMMIT")]
    );
}

#[test]
fn mysql_fixture() {
    let statements = parse_mysql(MYSQL_PROCEDURES);
    assert_eq!(
        lines_and_sql(&statements),
        vec![
            (1, "CREATE TABLE counters (id INT, value INT)"),
            (
                4,
                "CREATE PROCEDURE bump(IN counter_id INT)\nBEGIN\n  UPDATE counters SET value = value + 1 WHERE id = counter_id;\n  SELECT 'done\\'s; fine';\nEND"
            ),
            (11, "CALL bump(1)"),
        ]
    );
}

#[test]
fn mysql_directive_inside_comment_is_ignored() {
    let statements = parse_mysql("/*\nDELIMITER $$\n*/\nSELECT 1;\n");
    assert_eq!(lines_and_sql(&statements), vec![(4, "SELECT 1")]);
}

#[test]
fn mysql_unterminated_statement_names_active_delimiter() {
    let err = parse_err_with("DELIMITER $$\nSELECT 1;\n", &MySqlPolicy::new());
    assert_eq!(
        err,
        ScriptError::IncompleteStatement {
            line: 2,
            delimiter: "$$".to_string(),
        }
    );
}

#[test]
fn reparsing_is_idempotent() {
    for dialect in Dialect::ALL {
        let policy = dialect.policy();
        for source in [GENERIC_INIT, MYSQL_PROCEDURES] {
            let first = SqlScript::parse(source, &NO_PLACEHOLDERS, policy.as_ref());
            let second = SqlScript::parse(source, &NO_PLACEHOLDERS, policy.as_ref());
            assert_eq!(first, second, "dialect {dialect}");
        }
    }
}

#[test]
fn line_numbers_are_monotonic() {
    assert_monotonic(&parse_generic(GENERIC_INIT));
    assert_monotonic(&parse_mysql(MYSQL_PROCEDURES));
    assert_monotonic(&parse_oracle(include_str!(
        "fixtures/oracle/V3__functions_and_procedures.sql"
    )));
}

#[test]
fn statements_are_never_empty() {
    let statements = parse_with(";\n ; ;\nSELECT 1;\n;", &GenericPolicy);
    assert_eq!(statements.len(), 1);
    assert!(statements.iter().all(|s| !s.sql().trim().is_empty()));
}

#[test]
fn failure_is_all_or_nothing() {
    let result = SqlScript::new("SELECT 1;\nSELECT 2;\nSELECT 'oops;\n", &NO_PLACEHOLDERS);
    assert_eq!(result, Err(ScriptError::UnterminatedString { line: 3 }));
}
