//! # oxide-sql-script
//!
//! A dialect-aware SQL script lexer and statement splitter for migration
//! scripts.
//!
//! This crate provides:
//! - A fragment scanner that knows about string literals, quoted
//!   identifiers, line and block comments, and Oracle `q'[...]'` literals
//! - Per-dialect delimiter policies, including PL/SQL blocks terminated by
//!   `/` and MySQL `DELIMITER` directives
//! - `${name}` placeholder substitution applied before splitting
//!
//! ## Splitting a Script
//!
//! ```rust
//! use oxide_sql_script::{SqlScript, NO_PLACEHOLDERS};
//!
//! let script = SqlScript::new(
//!     "CREATE TABLE users (id INT);\n\nINSERT INTO users VALUES (1);\n",
//!     &NO_PLACEHOLDERS,
//! )
//! .unwrap();
//!
//! let statements = script.statements();
//! assert_eq!(statements.len(), 2);
//! assert_eq!(statements[1].line_number(), 3);
//! assert_eq!(statements[1].sql(), "INSERT INTO users VALUES (1)");
//! ```
//!
//! ## Oracle PL/SQL
//!
//! ```rust
//! use oxide_sql_script::dialect::OraclePolicy;
//! use oxide_sql_script::{SqlScript, NO_PLACEHOLDERS};
//!
//! let source = "BEGIN\n  DELETE FROM t;\nEND;\n/\nCOMMIT;\n";
//! let script = SqlScript::parse(source, &NO_PLACEHOLDERS, &OraclePolicy::new()).unwrap();
//!
//! assert_eq!(script.statements()[0].sql(), "BEGIN\n  DELETE FROM t;\nEND;");
//! assert_eq!(script.statements()[1].sql(), "COMMIT");
//! ```

pub mod dialect;
pub mod error;
pub mod lexer;
pub mod placeholder;
pub mod script;

pub use dialect::{DelimiterChange, DelimiterPolicy, Dialect};
pub use error::{Result, ScriptError};
pub use lexer::{ends_with_open_literal, Delimiter};
pub use placeholder::{PlaceholderError, PlaceholderReplacer, NO_PLACEHOLDERS};
pub use script::{SqlScript, Statement};
