//! Migration discovery.
//!
//! Scripts are named `V<version>__<description>.sql`. Version parts are
//! separated by `.` or `_` and compared numerically, so `V1_10` sorts after
//! `V1_9`. Underscores in the description become spaces.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::debug;

use oxide_sql_script::{DelimiterPolicy, PlaceholderReplacer, SqlScript, Statement};

use crate::error::{MigrateError, Result};

/// A numeric, dot-separated migration version.
///
/// Trailing zero parts are insignificant: `1`, `1.0` and `1_0_0` are the
/// same version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MigrationVersion(Vec<u64>);

impl MigrationVersion {
    /// Returns the numeric parts of the version.
    #[must_use]
    pub fn parts(&self) -> &[u64] {
        &self.0
    }
}

impl FromStr for MigrationVersion {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s
            .split(['.', '_'])
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(MigrateError::InvalidVersion(s.to_string()));
                }
                part.parse::<u64>()
                    .map_err(|_| MigrateError::InvalidVersion(s.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        while parts.len() > 1 && parts.last() == Some(&0) {
            parts.pop();
        }
        Ok(Self(parts))
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl Serialize for MigrationVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Returns the lowercase hex SHA-256 of a script's content.
#[must_use]
pub fn checksum(source: &str) -> String {
    format!("{:x}", Sha256::digest(source.as_bytes()))
}

/// A migration script found on disk, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMigration {
    /// Version parsed from the file name.
    pub version: MigrationVersion,
    /// Human-readable description parsed from the file name.
    pub description: String,
    /// File name of the script.
    pub script: String,
    /// Location the script was read from.
    pub path: PathBuf,
    /// Checksum of the script content.
    pub checksum: String,
    /// Raw script content, before placeholder substitution.
    pub sql: String,
}

impl ResolvedMigration {
    /// Builds a migration from a file name and its content.
    pub fn new(script: impl Into<String>, sql: impl Into<String>) -> Result<Self> {
        let script = script.into();
        let sql = sql.into();
        let (version, description) = parse_file_name(&script, &NamingScheme::default())?;
        Ok(Self {
            version,
            description,
            path: PathBuf::from(&script),
            checksum: checksum(&sql),
            script,
            sql,
        })
    }

    /// Splits the script into statements.
    pub fn statements(
        &self,
        replacer: &PlaceholderReplacer,
        policy: &dyn DelimiterPolicy,
    ) -> Result<Vec<Statement>> {
        SqlScript::parse(&self.sql, replacer, policy)
            .map(SqlScript::into_statements)
            .map_err(|source| MigrateError::Script {
                script: self.script.clone(),
                source,
            })
    }
}

/// File naming scheme for versioned migrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingScheme {
    /// File name prefix, `V` by default.
    pub prefix: String,
    /// Separator between version and description, `__` by default.
    pub separator: String,
    /// File name suffix, `.sql` by default.
    pub suffix: String,
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self {
            prefix: "V".to_string(),
            separator: "__".to_string(),
            suffix: ".sql".to_string(),
        }
    }
}

impl NamingScheme {
    /// Returns true if `name` looks like a versioned migration.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        name.len() > self.prefix.len() + self.suffix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.suffix)
    }
}

/// Parses `V<version>__<description>.sql` into its version and description.
pub fn parse_file_name(name: &str, scheme: &NamingScheme) -> Result<(MigrationVersion, String)> {
    let invalid = |reason: &str| MigrateError::InvalidFileName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let stem = name
        .strip_prefix(scheme.prefix.as_str())
        .and_then(|rest| rest.strip_suffix(scheme.suffix.as_str()))
        .ok_or_else(|| {
            invalid(&format!(
                "expected {}<version>{}<description>{}",
                scheme.prefix, scheme.separator, scheme.suffix
            ))
        })?;

    let (version, description) = stem
        .split_once(scheme.separator.as_str())
        .ok_or_else(|| invalid(&format!("missing '{}' separator", scheme.separator)))?;

    let version = version
        .parse::<MigrationVersion>()
        .map_err(|_| invalid(&format!("'{version}' is not a valid version")))?;

    Ok((version, description.replace('_', " ")))
}

/// Discovers migration scripts in a set of directories.
#[derive(Debug, Clone)]
pub struct MigrationResolver {
    locations: Vec<PathBuf>,
    scheme: NamingScheme,
}

impl MigrationResolver {
    /// Creates a resolver for the given directories.
    pub fn new<P: Into<PathBuf>>(locations: impl IntoIterator<Item = P>) -> Self {
        Self {
            locations: locations.into_iter().map(Into::into).collect(),
            scheme: NamingScheme::default(),
        }
    }

    /// Uses a custom naming scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: NamingScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Returns the configured locations.
    #[must_use]
    pub fn locations(&self) -> &[PathBuf] {
        &self.locations
    }

    /// Reads every migration script, ordered by version.
    ///
    /// Fails if a location is missing, a matching file is misnamed, or two
    /// scripts share a version.
    pub fn resolve(&self) -> Result<Vec<ResolvedMigration>> {
        let mut files = Vec::new();
        for location in &self.locations {
            if !location.is_dir() {
                return Err(MigrateError::MigrationsDirNotFound(location.clone()));
            }
            collect_files(location, &mut files)?;
        }

        let mut migrations = Vec::new();
        for path in files {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !self.scheme.matches(name) {
                debug!(path = %path.display(), "Ignoring non-migration file");
                continue;
            }

            let (version, description) = parse_file_name(name, &self.scheme)?;
            let sql = fs::read_to_string(&path)?;
            debug!(version = %version, script = %name, "Resolved migration");

            migrations.push(ResolvedMigration {
                version,
                description,
                script: name.to_string(),
                checksum: checksum(&sql),
                path,
                sql,
            });
        }

        migrations.sort_by(|a, b| a.version.cmp(&b.version));
        if let Some(pair) = migrations
            .windows(2)
            .find(|pair| pair[0].version == pair[1].version)
        {
            return Err(MigrateError::DuplicateVersion {
                version: pair[0].version.clone(),
                first: pair[0].script.clone(),
                second: pair[1].script.clone(),
            });
        }

        Ok(migrations)
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}
