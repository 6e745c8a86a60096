//! SQL script lexer.
//!
//! This module provides a hand-written scanner that walks script text one
//! fragment at a time and tracks whether the current position is code, a
//! literal, or a comment. Only fragments scanned in code context can end a
//! statement.

mod context;
mod delimiter;
mod quoting;
mod scanner;

pub use context::{Comment, Context, Literal};
pub use delimiter::Delimiter;
pub use quoting::AlternateQuoting;
pub use scanner::{ends_with_open_literal, FragmentKind, Scanner, Step};
