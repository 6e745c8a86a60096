//! Shared helpers for migration integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use oxide_migrate::prelude::*;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tempfile::TempDir;

/// Creates a single-connection in-memory database.
pub async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// Creates a migrations directory holding the given scripts.
pub fn migrations_dir(scripts: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for (name, sql) in scripts {
        write_script(dir.path(), name, sql);
    }
    dir
}

/// Writes (or overwrites) a script in `dir`.
pub fn write_script(dir: &Path, name: &str, sql: &str) {
    fs::write(dir.join(name), sql).expect("Failed to write script");
}

/// Resolves the scripts in `dir`.
pub fn resolve(dir: &Path) -> Vec<ResolvedMigration> {
    MigrationResolver::new([dir])
        .resolve()
        .expect("Failed to resolve migrations")
}

/// Returns the names of user tables, sorted.
pub async fn tables(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_as::<_, (String,)>(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .expect("Failed to list tables")
    .into_iter()
    .map(|(name,)| name)
    .collect()
}

/// Returns the recorded history as `(version, success)` pairs.
pub async fn history(migrator: &Migrator) -> Vec<(String, bool)> {
    migrator
        .history()
        .get_applied()
        .await
        .expect("Failed to read history")
        .into_iter()
        .map(|row| (row.version.to_string(), row.success))
        .collect()
}
