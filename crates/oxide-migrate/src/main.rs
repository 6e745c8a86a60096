//! oxide-migrate CLI
//!
//! Command-line tool for applying SQL script migrations.

use std::path::PathBuf;
use std::str::FromStr;

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_migrate::prelude::*;

/// Versioned SQL script migrations.
#[derive(Parser)]
#[command(name = "oxide-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Directories containing migration scripts.
    #[arg(
        short,
        long = "location",
        env = "OXIDE_LOCATIONS",
        value_delimiter = ',',
        default_value = "migrations"
    )]
    locations: Vec<PathBuf>,

    /// Dialect used to split scripts.
    #[arg(
        long,
        env = "OXIDE_DIALECT",
        default_value = "generic",
        ignore_case = true,
        value_parser = dialect_parser()
    )]
    dialect: Dialect,

    /// Placeholder value, as KEY=VALUE. May be repeated.
    #[arg(short = 'p', long = "placeholder", value_parser = parse_placeholder)]
    placeholders: Vec<(String, String)>,

    /// Placeholder prefix.
    #[arg(long, default_value = PlaceholderReplacer::DEFAULT_PREFIX)]
    placeholder_prefix: String,

    /// Placeholder suffix.
    #[arg(long, default_value = PlaceholderReplacer::DEFAULT_SUFFIX)]
    placeholder_suffix: String,

    /// Allow pending migrations older than the latest applied one.
    #[arg(long)]
    out_of_order: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the migrations system (create history table).
    Init,

    /// Apply pending migrations.
    Migrate {
        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Show migration status.
    Info {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Check scripts against the history table.
    Validate,

    /// Remove failed history entries and realign checksums.
    Repair,

    /// Print the statements of a script without touching the database.
    Split {
        /// Script to split.
        file: PathBuf,

        /// Print JSON instead of SQL.
        #[arg(long)]
        json: bool,
    },
}

fn dialect_parser() -> impl TypedValueParser<Value = Dialect> {
    PossibleValuesParser::new(Dialect::ALL.map(Dialect::as_str))
        .try_map(|name| name.parse::<Dialect>())
}

impl Cli {
    fn config(&self) -> MigrateConfig {
        MigrateConfig {
            database_url: self.database.clone(),
            locations: self.locations.clone(),
            dialect: self.dialect,
            placeholders: self.placeholders.iter().cloned().collect(),
            placeholder_prefix: self.placeholder_prefix.clone(),
            placeholder_suffix: self.placeholder_suffix.clone(),
            out_of_order: self.out_of_order,
        }
    }
}

async fn connect(config: &MigrateConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

fn print_info(rows: &[MigrationInfo]) {
    if rows.is_empty() {
        info!("No migrations found.");
        return;
    }

    println!();
    println!(
        "{:<10} {:<32} {:<14} {:<20}",
        "Version", "Description", "State", "Installed on"
    );
    println!("{:-<78}", "");
    for row in rows {
        let installed_on = row
            .installed_on
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{:<10} {:<32} {:<14} {:<20}",
            row.version.to_string(),
            row.description,
            row.state.label(),
            installed_on
        );
    }
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.config();

    if let Commands::Split { file, json } = &cli.command {
        let source = std::fs::read_to_string(file)?;
        let policy = config.dialect.policy();
        let script = SqlScript::parse(&source, &config.replacer(), policy.as_ref())?;

        if *json {
            println!("{}", serde_json::to_string_pretty(script.statements())?);
        } else {
            for statement in &script {
                println!("-- line {}\n{}\n", statement.line_number(), statement.sql());
            }
        }
        info!(statements = script.len(), dialect = %config.dialect, "Split script");
        return Ok(());
    }

    let pool = connect(&config).await?;
    let migrator = Migrator::from_config(pool, &config);

    match cli.command {
        Commands::Init => {
            info!("Initializing migrations system...");
            migrator.init().await?;
            info!("History table created successfully.");
        }

        Commands::Migrate { dry_run } => {
            let migrator = migrator.dry_run(dry_run);
            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }
            let resolved = config.resolver().resolve()?;
            let applied = migrator.migrate(&resolved).await?;
            info!(applied, "Migrate finished");
        }

        Commands::Info { json } => {
            let resolved = config.resolver().resolve()?;
            let rows = migrator.info(&resolved).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_info(&rows);
            }
        }

        Commands::Validate => {
            let resolved = config.resolver().resolve()?;
            migrator.validate(&resolved).await?;
            for migration in &resolved {
                migrator.statements(migration)?;
            }
            info!(count = resolved.len(), "Successfully validated migrations");
        }

        Commands::Repair => {
            let resolved = config.resolver().resolve()?;
            let report = migrator.repair(&resolved).await?;
            if report == RepairReport::default() {
                warn!("Nothing to repair.");
            } else {
                info!(
                    removed = report.removed,
                    realigned = report.realigned,
                    "Repair finished"
                );
            }
        }

        Commands::Split { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_flag() {
        let cli = Cli::try_parse_from(["oxide-migrate", "--dialect", "Oracle", "info"]).unwrap();
        assert_eq!(cli.dialect, Dialect::Oracle);

        let cli = Cli::try_parse_from(["oxide-migrate", "validate"]).unwrap();
        assert_eq!(cli.dialect, Dialect::Generic);

        let err = Cli::try_parse_from(["oxide-migrate", "--dialect", "db2", "info"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_placeholder_flags_build_config() {
        let cli = Cli::try_parse_from([
            "oxide-migrate",
            "-p",
            "schema=app",
            "--placeholder",
            "owner=alice",
            "migrate",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.placeholders.len(), 2);
        assert_eq!(config.placeholders["schema"], "app");
        assert!(matches!(cli.command, Commands::Migrate { dry_run: false }));
    }

    #[test]
    fn test_no_placeholder_flags_still_reject_references() {
        let cli = Cli::try_parse_from(["oxide-migrate", "split", "V1__init.sql"]).unwrap();
        let err = cli.config().replacer().replace("SELECT ${missing};").unwrap_err();
        assert_eq!(err.line(), 1);
    }
}
