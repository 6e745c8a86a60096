//! Versioned SQL script migrations for Rust.
//!
//! `oxide-migrate` applies `V<version>__<description>.sql` scripts to a
//! SQLite database in version order and records each attempt in the
//! `oxide_schema_history` table. Scripts are split into statements by
//! [`oxide_sql_script`], so PL/SQL blocks, MySQL `DELIMITER` directives and
//! `${name}` placeholders are handled before anything reaches the database.
//!
//! # Architecture
//!
//! - **Resolver** - Discovers scripts, parses versions, computes checksums
//! - **History** - Reads and writes the history table
//! - **Migrator** - Validates, applies, reports and repairs
//! - **Config** - Settings shared by the CLI commands
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_migrate::prelude::*;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! let pool = SqlitePoolOptions::new().connect("sqlite:app.db").await?;
//! let resolved = MigrationResolver::new(["migrations"]).resolve()?;
//!
//! let migrator = Migrator::new(pool).dialect(Dialect::Oracle);
//! let applied = migrator.migrate(&resolved).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Apply pending migrations
//! oxide-migrate migrate
//!
//! # Show migration status
//! oxide-migrate info
//!
//! # Remove failed entries after fixing a script
//! oxide-migrate repair
//!
//! # Print the statements of a script
//! oxide-migrate --dialect oracle split migrations/V1__init.sql
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod history;
pub mod resolver;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{parse_placeholder, MigrateConfig};
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::{MigrationInfo, MigrationState, Migrator, RepairReport};
    pub use crate::history::{AppliedMigration, MigrationHistory};
    pub use crate::resolver::{
        checksum, MigrationResolver, MigrationVersion, NamingScheme, ResolvedMigration,
    };
    pub use oxide_sql_script::{Dialect, PlaceholderReplacer, SqlScript, Statement};
}
