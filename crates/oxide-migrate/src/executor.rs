//! Migration executor.
//!
//! This module validates resolved scripts against the history table and
//! applies pending ones, each inside its own `BEGIN IMMEDIATE` transaction.
//! Scripts that issue their own `BEGIN`, `COMMIT` or `ROLLBACK` run without
//! the wrapping transaction.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use oxide_sql_script::{DelimiterPolicy, Dialect, PlaceholderReplacer, Statement};

use crate::config::MigrateConfig;
use crate::error::{MigrateError, Result};
use crate::history::{AppliedMigration, MigrationHistory};
use crate::resolver::{MigrationVersion, ResolvedMigration};

/// State of a migration as reported by [`Migrator::info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    /// Resolved and not applied yet.
    Pending,
    /// Resolved, not applied, and older than the latest applied version.
    OutOfOrder,
    /// Applied successfully.
    Success,
    /// Applied and failed.
    Failed,
    /// Applied but no longer resolved.
    Missing,
}

impl MigrationState {
    /// Returns a short label for table output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::OutOfOrder => "Out of order",
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Missing => "Missing",
        }
    }
}

/// One row of [`Migrator::info`].
#[derive(Debug, Clone, Serialize)]
pub struct MigrationInfo {
    /// Migration version.
    pub version: MigrationVersion,
    /// Migration description.
    pub description: String,
    /// Script file name.
    pub script: String,
    /// Current state.
    pub state: MigrationState,
    /// When the migration ran, if it did.
    pub installed_on: Option<DateTime<Utc>>,
    /// How long the migration took, if it ran.
    pub execution_time_ms: Option<i64>,
}

/// What [`Migrator::repair`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Failed history rows removed.
    pub removed: u64,
    /// Successful rows whose checksum was realigned with the local script.
    pub realigned: usize,
}

/// Applies SQL migration scripts to a SQLite database.
pub struct Migrator {
    pool: SqlitePool,
    history: MigrationHistory,
    policy: Box<dyn DelimiterPolicy>,
    replacer: PlaceholderReplacer,
    dry_run: bool,
    out_of_order: bool,
}

impl Migrator {
    /// Creates a migrator that splits scripts with the generic dialect.
    pub fn new(pool: SqlitePool) -> Self {
        let history = MigrationHistory::new(pool.clone());
        Self {
            pool,
            history,
            policy: Dialect::Generic.policy(),
            replacer: PlaceholderReplacer::none(),
            dry_run: false,
            out_of_order: false,
        }
    }

    /// Creates a migrator from settings.
    pub fn from_config(pool: SqlitePool, config: &MigrateConfig) -> Self {
        Self::new(pool)
            .dialect(config.dialect)
            .placeholders(config.replacer())
            .out_of_order(config.out_of_order)
    }

    /// Sets the dialect used to split scripts.
    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.policy = dialect.policy();
        self
    }

    /// Sets the placeholder replacer.
    #[must_use]
    pub fn placeholders(mut self, replacer: PlaceholderReplacer) -> Self {
        self.replacer = replacer;
        self
    }

    /// Enables dry-run mode (SQL is printed but not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Allows pending migrations older than the latest applied one.
    #[must_use]
    pub fn out_of_order(mut self, enabled: bool) -> Self {
        self.out_of_order = enabled;
        self
    }

    /// Ensures the history table exists.
    pub async fn init(&self) -> Result<()> {
        if !self.dry_run {
            self.history.ensure_table().await?;
        }
        Ok(())
    }

    /// Returns the migration history.
    #[must_use]
    pub fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// Splits a migration's script with the configured dialect and placeholders.
    pub fn statements(&self, migration: &ResolvedMigration) -> Result<Vec<Statement>> {
        migration.statements(&self.replacer, self.policy.as_ref())
    }

    async fn applied_rows(&self) -> Result<Vec<AppliedMigration>> {
        if !self.history.table_exists().await? {
            return Ok(Vec::new());
        }
        self.history.get_applied().await
    }

    /// Checks resolved scripts against the history table.
    ///
    /// Fails on a failed history row, an applied migration that is no longer
    /// resolved, a modified script, or (unless allowed) a pending migration
    /// older than the latest applied one.
    pub async fn validate(&self, resolved: &[ResolvedMigration]) -> Result<()> {
        let applied = self.applied_rows().await?;

        if let Some(row) = applied.iter().find(|row| !row.success) {
            return Err(MigrateError::FailedMigration {
                version: row.version.clone(),
                script: row.script.clone(),
            });
        }

        let by_version: HashMap<&MigrationVersion, &ResolvedMigration> = resolved
            .iter()
            .map(|migration| (&migration.version, migration))
            .collect();

        for row in &applied {
            match by_version.get(&row.version) {
                None => {
                    return Err(MigrateError::MissingMigration {
                        version: row.version.clone(),
                        script: row.script.clone(),
                    });
                }
                Some(migration) if migration.checksum != row.checksum => {
                    return Err(MigrateError::ChecksumMismatch {
                        version: row.version.clone(),
                        applied: row.checksum.clone(),
                        resolved: migration.checksum.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if !self.out_of_order {
            let applied_versions: HashSet<&MigrationVersion> =
                applied.iter().map(|row| &row.version).collect();
            if let Some(latest) = applied_versions.iter().max() {
                if let Some(migration) = resolved.iter().find(|migration| {
                    migration.version < **latest && !applied_versions.contains(&migration.version)
                }) {
                    return Err(MigrateError::OutOfOrder {
                        version: migration.version.clone(),
                        latest: (*latest).clone(),
                    });
                }
            }
        }

        debug!(resolved = resolved.len(), applied = applied.len(), "Validated migrations");
        Ok(())
    }

    /// Returns the resolved migrations that have no history row.
    pub async fn pending<'a>(
        &self,
        resolved: &'a [ResolvedMigration],
    ) -> Result<Vec<&'a ResolvedMigration>> {
        let applied: HashSet<MigrationVersion> = self
            .applied_rows()
            .await?
            .into_iter()
            .map(|row| row.version)
            .collect();
        Ok(resolved
            .iter()
            .filter(|migration| !applied.contains(&migration.version))
            .collect())
    }

    /// Validates, then applies every pending migration in version order.
    ///
    /// All pending scripts are split before the first one runs, so a parse
    /// error leaves the database untouched. Returns how many migrations ran.
    pub async fn migrate(&self, resolved: &[ResolvedMigration]) -> Result<usize> {
        self.init().await?;
        self.validate(resolved).await?;

        let pending = self.pending(resolved).await?;
        if pending.is_empty() {
            info!("Schema is up to date, no migration necessary");
            return Ok(0);
        }

        let plans = pending
            .into_iter()
            .map(|migration| Ok((migration, self.statements(migration)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut count = 0;
        for (migration, statements) in &plans {
            if self.apply(migration, statements).await? {
                count += 1;
            }
        }

        info!(count, "Successfully applied migrations");
        Ok(count)
    }

    /// Applies a single migration.
    ///
    /// Returns `false` if another process applied it first.
    pub async fn apply(
        &self,
        migration: &ResolvedMigration,
        statements: &[Statement],
    ) -> Result<bool> {
        info!(
            version = %migration.version,
            script = %migration.script,
            "Applying migration"
        );

        if self.dry_run {
            for statement in statements {
                println!(
                    "-- {}:{}\n{}\n",
                    migration.script,
                    statement.line_number(),
                    statement.sql()
                );
            }
            return Ok(true);
        }

        let mut conn = self.pool.acquire().await?;
        if statements
            .iter()
            .any(|statement| transaction_control(statement.sql()).is_some())
        {
            warn!(
                version = %migration.version,
                "Script controls its own transactions, running it unwrapped"
            );
            return Self::run_unwrapped(&mut conn, migration, statements).await;
        }

        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let started = Instant::now();
        match Self::run_locked(&mut conn, migration, statements, started).await {
            Ok(applied) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(applied)
            }
            Err(err) => {
                if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    warn!(error = %rollback, "Rollback failed");
                }
                if matches!(err, MigrateError::StatementFailed { .. }) {
                    warn!(
                        version = %migration.version,
                        error = %err,
                        "Migration failed, recording failure"
                    );
                    MigrationHistory::record(&mut conn, migration, elapsed_ms(started), false)
                        .await?;
                }
                Err(err)
            }
        }
    }

    async fn run_locked(
        conn: &mut SqliteConnection,
        migration: &ResolvedMigration,
        statements: &[Statement],
        started: Instant,
    ) -> Result<bool> {
        // Re-check under the write lock
        if MigrationHistory::find(conn, &migration.version).await?.is_some() {
            warn!(
                version = %migration.version,
                "Migration already applied, skipping"
            );
            return Ok(false);
        }

        for statement in statements {
            debug!(line = statement.line_number(), sql = %statement.sql(), "Executing SQL");
            sqlx::raw_sql(statement.sql())
                .execute(&mut *conn)
                .await
                .map_err(|source| MigrateError::StatementFailed {
                    script: migration.script.clone(),
                    line: statement.line_number(),
                    source,
                })?;
        }

        MigrationHistory::record(conn, migration, elapsed_ms(started), true).await?;
        Ok(true)
    }

    /// Runs a script that begins or ends transactions itself.
    ///
    /// The history row is written outside the script's transactions, or
    /// committed together with one the script leaves open.
    async fn run_unwrapped(
        conn: &mut SqliteConnection,
        migration: &ResolvedMigration,
        statements: &[Statement],
    ) -> Result<bool> {
        if MigrationHistory::find(conn, &migration.version).await?.is_some() {
            warn!(
                version = %migration.version,
                "Migration already applied, skipping"
            );
            return Ok(false);
        }

        let started = Instant::now();
        let mut open = false;
        for statement in statements {
            debug!(line = statement.line_number(), sql = %statement.sql(), "Executing SQL");
            if let Err(source) = sqlx::raw_sql(statement.sql()).execute(&mut *conn).await {
                if open {
                    if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                        warn!(error = %rollback, "Rollback failed");
                    }
                }
                let err = MigrateError::StatementFailed {
                    script: migration.script.clone(),
                    line: statement.line_number(),
                    source,
                };
                warn!(
                    version = %migration.version,
                    error = %err,
                    "Migration failed, recording failure"
                );
                MigrationHistory::record(conn, migration, elapsed_ms(started), false).await?;
                return Err(err);
            }
            match transaction_control(statement.sql()) {
                Some(TransactionControl::Begin) => open = true,
                Some(TransactionControl::End) => open = false,
                None => {}
            }
        }

        MigrationHistory::record(conn, migration, elapsed_ms(started), true).await?;
        if open {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
        }
        Ok(true)
    }

    /// Reports the state of every resolved and applied migration.
    pub async fn info(&self, resolved: &[ResolvedMigration]) -> Result<Vec<MigrationInfo>> {
        let applied = self.applied_rows().await?;
        let latest = applied
            .iter()
            .filter(|row| row.success)
            .map(|row| &row.version)
            .max();
        let by_version: HashMap<&MigrationVersion, &AppliedMigration> =
            applied.iter().map(|row| (&row.version, row)).collect();

        let mut rows: Vec<MigrationInfo> = resolved
            .iter()
            .map(|migration| match by_version.get(&migration.version) {
                Some(row) => MigrationInfo {
                    version: migration.version.clone(),
                    description: migration.description.clone(),
                    script: migration.script.clone(),
                    state: if row.success {
                        MigrationState::Success
                    } else {
                        MigrationState::Failed
                    },
                    installed_on: Some(row.installed_on),
                    execution_time_ms: Some(row.execution_time_ms),
                },
                None => MigrationInfo {
                    version: migration.version.clone(),
                    description: migration.description.clone(),
                    script: migration.script.clone(),
                    state: match latest {
                        Some(latest) if migration.version < *latest => MigrationState::OutOfOrder,
                        _ => MigrationState::Pending,
                    },
                    installed_on: None,
                    execution_time_ms: None,
                },
            })
            .collect();

        let resolved_versions: HashSet<&MigrationVersion> =
            resolved.iter().map(|migration| &migration.version).collect();
        rows.extend(
            applied
                .iter()
                .filter(|row| !resolved_versions.contains(&row.version))
                .map(|row| MigrationInfo {
                    version: row.version.clone(),
                    description: row.description.clone(),
                    script: row.script.clone(),
                    state: MigrationState::Missing,
                    installed_on: Some(row.installed_on),
                    execution_time_ms: Some(row.execution_time_ms),
                }),
        );
        rows.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(rows)
    }

    /// Removes failed history rows and realigns checksums of applied scripts.
    pub async fn repair(&self, resolved: &[ResolvedMigration]) -> Result<RepairReport> {
        self.history.ensure_table().await?;

        let removed = self.history.delete_failed().await?;
        if removed > 0 {
            info!(removed, "Removed failed migration entries");
        }

        let applied: HashMap<MigrationVersion, AppliedMigration> = self
            .history
            .get_applied()
            .await?
            .into_iter()
            .map(|row| (row.version.clone(), row))
            .collect();

        let mut realigned = 0;
        for migration in resolved {
            let Some(row) = applied.get(&migration.version) else {
                continue;
            };
            if row.checksum != migration.checksum && self.history.realign(migration).await? {
                info!(version = %migration.version, "Realigned checksum");
                realigned += 1;
            }
        }

        Ok(RepairReport { removed, realigned })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionControl {
    Begin,
    End,
}

/// Classifies a statement that opens or closes a transaction.
///
/// `BEGIN` only counts when followed by transaction keywords, so PL/SQL and
/// trigger blocks are not mistaken for it. `ROLLBACK TO` keeps the
/// transaction open.
fn transaction_control(sql: &str) -> Option<TransactionControl> {
    let words: Vec<String> = sql
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_uppercase)
        .collect();
    let (first, rest) = words.split_first()?;
    let only = |allowed: &[&str]| rest.iter().all(|word| allowed.contains(&word.as_str()));

    match first.as_str() {
        "BEGIN" if only(&["TRANSACTION", "WORK", "DEFERRED", "IMMEDIATE", "EXCLUSIVE"]) => {
            Some(TransactionControl::Begin)
        }
        "START" if rest.first().is_some_and(|word| word == "TRANSACTION") => {
            Some(TransactionControl::Begin)
        }
        "COMMIT" | "END" if only(&["TRANSACTION", "WORK"]) => Some(TransactionControl::End),
        "ROLLBACK" if !rest.iter().any(|word| word == "TO") => Some(TransactionControl::End),
        _ => None,
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}
