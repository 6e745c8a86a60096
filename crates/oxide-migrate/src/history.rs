//! Migration history tracking.
//!
//! This module manages the `oxide_schema_history` table that records every
//! migration attempt, successful or not.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool};

use crate::error::{MigrateError, Result};
use crate::resolver::{MigrationVersion, ResolvedMigration};

/// Name of the history table.
pub const HISTORY_TABLE: &str = "oxide_schema_history";

/// SQL to create the history table (SQLite).
pub const CREATE_HISTORY_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS oxide_schema_history (
    installed_rank INTEGER PRIMARY KEY AUTOINCREMENT,
    version TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    script TEXT NOT NULL,
    checksum TEXT NOT NULL,
    installed_on TEXT NOT NULL DEFAULT (datetime('now')),
    execution_time_ms INTEGER NOT NULL,
    success INTEGER NOT NULL
)
"#;

const SELECT_COLUMNS: &str = "SELECT installed_rank, version, description, script, checksum, \
     installed_on, execution_time_ms, success FROM oxide_schema_history";

type HistoryRow = (i64, String, String, String, String, String, i64, bool);

/// A row of the history table.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    /// Order in which the migration was recorded.
    pub installed_rank: i64,
    /// Migration version.
    pub version: MigrationVersion,
    /// Migration description.
    pub description: String,
    /// Script file name.
    pub script: String,
    /// Checksum of the script when it ran.
    pub checksum: String,
    /// When the migration ran.
    pub installed_on: DateTime<Utc>,
    /// How long the migration took.
    pub execution_time_ms: i64,
    /// Whether every statement succeeded.
    pub success: bool,
}

impl AppliedMigration {
    fn from_row(row: HistoryRow) -> Result<Self> {
        let (installed_rank, version, description, script, checksum, installed_on, execution_time_ms, success) =
            row;
        Ok(Self {
            installed_rank,
            version: version.parse()?,
            description,
            script,
            checksum,
            installed_on: parse_timestamp(&installed_on)?,
            execution_time_ms,
            success,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite datetime format fallback
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .map_err(|_| MigrateError::InvalidTimestamp(value.to_string()))
}

/// Manages the migration history in the database.
pub struct MigrationHistory {
    pool: SqlitePool,
}

impl MigrationHistory {
    /// Creates a new migration history manager.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensures the history table exists.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_HISTORY_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns true if the history table exists.
    pub async fn table_exists(&self) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(HISTORY_TABLE)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Records a migration attempt on `conn`.
    ///
    /// Takes a connection rather than the pool so that a successful run is
    /// recorded inside the migration's own transaction.
    pub async fn record(
        conn: &mut SqliteConnection,
        migration: &ResolvedMigration,
        execution_time_ms: i64,
        success: bool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO oxide_schema_history \
             (version, description, script, checksum, installed_on, execution_time_ms, success) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(migration.version.to_string())
        .bind(&migration.description)
        .bind(&migration.script)
        .bind(&migration.checksum)
        .bind(Utc::now().to_rfc3339())
        .bind(execution_time_ms)
        .bind(success)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Looks up the row for `version` on `conn`.
    pub async fn find(
        conn: &mut SqliteConnection,
        version: &MigrationVersion,
    ) -> Result<Option<AppliedMigration>> {
        let row: Option<HistoryRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE version = ?"))
            .bind(version.to_string())
            .fetch_optional(conn)
            .await?;
        row.map(AppliedMigration::from_row).transpose()
    }

    /// Gets every history row, in installation order.
    pub async fn get_applied(&self) -> Result<Vec<AppliedMigration>> {
        let rows: Vec<HistoryRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY installed_rank"))
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(AppliedMigration::from_row).collect()
    }

    /// Gets the rows of failed attempts.
    pub async fn get_failed(&self) -> Result<Vec<AppliedMigration>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE success = 0 ORDER BY installed_rank"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AppliedMigration::from_row).collect()
    }

    /// Deletes the rows of failed attempts, returning how many were removed.
    pub async fn delete_failed(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM oxide_schema_history WHERE success = 0")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Overwrites the recorded checksum and description of `version`.
    pub async fn realign(&self, migration: &ResolvedMigration) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE oxide_schema_history SET checksum = ?, description = ?, script = ? \
             WHERE version = ? AND success = 1",
        )
        .bind(&migration.checksum)
        .bind(&migration.description)
        .bind(&migration.script)
        .bind(migration.version.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Counts successful migrations.
    pub async fn count_applied(&self) -> Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM oxide_schema_history WHERE success = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool")
    }

    fn migration(script: &str) -> ResolvedMigration {
        ResolvedMigration::new(script, "SELECT 1;\n").unwrap()
    }

    #[tokio::test]
    async fn test_ensure_table() {
        let pool = create_test_pool().await;
        let history = MigrationHistory::new(pool);

        assert!(!history.table_exists().await.unwrap());
        history.ensure_table().await.unwrap();
        // Should be idempotent
        history.ensure_table().await.unwrap();
        assert!(history.table_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_record_and_find() {
        let pool = create_test_pool().await;
        let history = MigrationHistory::new(pool.clone());
        history.ensure_table().await.unwrap();

        let v1 = migration("V1__create_users.sql");
        let mut conn = pool.acquire().await.unwrap();
        assert!(MigrationHistory::find(&mut conn, &v1.version).await.unwrap().is_none());

        MigrationHistory::record(&mut conn, &v1, 12, true).await.unwrap();
        let row = MigrationHistory::find(&mut conn, &v1.version)
            .await
            .unwrap()
            .unwrap();
        drop(conn);

        assert_eq!(row.installed_rank, 1);
        assert_eq!(row.description, "create users");
        assert_eq!(row.script, "V1__create_users.sql");
        assert_eq!(row.checksum, v1.checksum);
        assert_eq!(row.execution_time_ms, 12);
        assert!(row.success);
        assert_eq!(history.count_applied().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_rows() {
        let pool = create_test_pool().await;
        let history = MigrationHistory::new(pool.clone());
        history.ensure_table().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        MigrationHistory::record(&mut conn, &migration("V1__ok.sql"), 1, true)
            .await
            .unwrap();
        MigrationHistory::record(&mut conn, &migration("V2__broken.sql"), 1, false)
            .await
            .unwrap();
        drop(conn);

        let all = history.get_applied().await.unwrap();
        assert_eq!(all.len(), 2);
        let failed = history.get_failed().await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].version.to_string(), "2");
        assert_eq!(history.count_applied().await.unwrap(), 1);

        assert_eq!(history.delete_failed().await.unwrap(), 1);
        assert!(history.get_failed().await.unwrap().is_empty());
        assert_eq!(history.get_applied().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_realign() {
        let pool = create_test_pool().await;
        let history = MigrationHistory::new(pool.clone());
        history.ensure_table().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        MigrationHistory::record(&mut conn, &migration("V1__init.sql"), 1, true)
            .await
            .unwrap();
        drop(conn);

        let edited = ResolvedMigration::new("V1__init.sql", "SELECT 2;\n").unwrap();
        assert!(history.realign(&edited).await.unwrap());
        let rows = history.get_applied().await.unwrap();
        assert_eq!(rows[0].checksum, edited.checksum);

        let unknown = migration("V9__unknown.sql");
        assert!(!history.realign(&unknown).await.unwrap());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-01T10:00:00+00:00").unwrap();
        let sqlite = parse_timestamp("2024-03-01 10:00:00").unwrap();
        assert_eq!(rfc, sqlite);
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(MigrateError::InvalidTimestamp(value)) if value == "yesterday"
        ));
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_reported() {
        let pool = create_test_pool().await;
        let history = MigrationHistory::new(pool.clone());
        history.ensure_table().await.unwrap();

        sqlx::query(
            "INSERT INTO oxide_schema_history \
             (version, description, script, checksum, installed_on, execution_time_ms, success) \
             VALUES ('1', 'init', 'V1__init.sql', 'abc', 'not a date', 0, 1)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = history.get_applied().await.unwrap_err();
        assert!(matches!(err, MigrateError::InvalidTimestamp(value) if value == "not a date"));
    }
}
