//! Error types for the migration engine.

use std::path::PathBuf;

use oxide_sql_script::ScriptError;

use crate::resolver::MigrationVersion;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error during migration execution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error while reading migration files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A migration location does not exist.
    #[error("Migrations directory not found: {0}")]
    MigrationsDirNotFound(PathBuf),

    /// A migration script could not be split into statements.
    #[error("Failed to parse migration script '{script}': {source}")]
    Script {
        /// File name of the script.
        script: String,
        /// The underlying parse error.
        #[source]
        source: ScriptError,
    },

    /// A file matched the migration prefix and suffix but not the naming scheme.
    #[error("Invalid migration file name '{name}': {reason}")]
    InvalidFileName {
        /// The offending file name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A version string could not be parsed.
    #[error("Invalid migration version '{0}'")]
    InvalidVersion(String),

    /// A history row holds a timestamp that cannot be parsed.
    #[error("Invalid installed_on timestamp '{0}' in the history table")]
    InvalidTimestamp(String),

    /// Two scripts resolve to the same version.
    #[error("Found more than one migration with version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        /// The shared version.
        version: MigrationVersion,
        /// The first script.
        first: String,
        /// The second script.
        second: String,
    },

    /// An applied script was modified after it ran.
    #[error("Checksum mismatch for migration {version}: applied {applied}, resolved locally {resolved}")]
    ChecksumMismatch {
        /// The migration version.
        version: MigrationVersion,
        /// Checksum recorded in the history table.
        applied: String,
        /// Checksum of the script on disk.
        resolved: String,
    },

    /// An applied migration has no script anymore.
    #[error("Migration {version} ('{script}') was applied but is not resolved locally")]
    MissingMigration {
        /// The migration version.
        version: MigrationVersion,
        /// Script name recorded in the history table.
        script: String,
    },

    /// A pending migration is older than the latest applied one.
    #[error("Migration {version} is pending but older than the latest applied version {latest}")]
    OutOfOrder {
        /// The pending version.
        version: MigrationVersion,
        /// The latest applied version.
        latest: MigrationVersion,
    },

    /// A previous run left a failed history row behind.
    #[error("Migration {version} ('{script}') failed previously; run `repair` before migrating")]
    FailedMigration {
        /// The failed version.
        version: MigrationVersion,
        /// Script name recorded in the history table.
        script: String,
    },

    /// A statement was rejected by the database.
    #[error("Migration '{script}' failed at line {line}: {source}")]
    StatementFailed {
        /// File name of the script.
        script: String,
        /// Line on which the failing statement starts.
        line: usize,
        /// The database error.
        #[source]
        source: sqlx::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_error_message() {
        let err = MigrateError::Script {
            script: "V1__init.sql".to_string(),
            source: ScriptError::UnterminatedString { line: 4 },
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse migration script 'V1__init.sql': Unterminated string literal starting at line 4"
        );
    }

    #[test]
    fn test_checksum_mismatch_message() {
        let err = MigrateError::ChecksumMismatch {
            version: "1.2".parse().unwrap(),
            applied: "aa".to_string(),
            resolved: "bb".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Checksum mismatch for migration 1.2: applied aa, resolved locally bb"
        );
    }
}
