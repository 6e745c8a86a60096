//! Migration settings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use oxide_sql_script::{Dialect, PlaceholderReplacer};

use crate::resolver::MigrationResolver;

/// Settings shared by every migration command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateConfig {
    /// Database URL.
    pub database_url: String,
    /// Directories that contain migration scripts.
    pub locations: Vec<PathBuf>,
    /// Dialect used to split scripts.
    pub dialect: Dialect,
    /// Placeholder values.
    pub placeholders: BTreeMap<String, String>,
    /// Placeholder prefix.
    pub placeholder_prefix: String,
    /// Placeholder suffix.
    pub placeholder_suffix: String,
    /// Whether pending migrations older than the latest applied one may run.
    pub out_of_order: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:db.sqlite3".to_string(),
            locations: vec![PathBuf::from("migrations")],
            dialect: Dialect::default(),
            placeholders: BTreeMap::new(),
            placeholder_prefix: PlaceholderReplacer::DEFAULT_PREFIX.to_string(),
            placeholder_suffix: PlaceholderReplacer::DEFAULT_SUFFIX.to_string(),
            out_of_order: false,
        }
    }
}

impl MigrateConfig {
    /// Builds the placeholder replacer for these settings.
    #[must_use]
    pub fn replacer(&self) -> PlaceholderReplacer {
        PlaceholderReplacer::new(self.placeholders.clone())
            .with_prefix(self.placeholder_prefix.clone())
            .with_suffix(self.placeholder_suffix.clone())
    }

    /// Builds the resolver for the configured locations.
    #[must_use]
    pub fn resolver(&self) -> MigrationResolver {
        MigrationResolver::new(self.locations.iter().cloned())
    }
}

/// Parses a `key=value` placeholder definition.
pub fn parse_placeholder(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid placeholder '{s}': expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid placeholder '{s}': empty key"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placeholder() {
        assert_eq!(
            parse_placeholder("schema=app"),
            Ok(("schema".to_string(), "app".to_string()))
        );
        assert_eq!(
            parse_placeholder("url=a=b"),
            Ok(("url".to_string(), "a=b".to_string()))
        );
        assert_eq!(
            parse_placeholder("empty="),
            Ok(("empty".to_string(), String::new()))
        );
        assert!(parse_placeholder("novalue").is_err());
        assert!(parse_placeholder("=x").is_err());
    }

    #[test]
    fn test_replacer_uses_prefix_and_suffix() {
        let config = MigrateConfig {
            placeholders: BTreeMap::from([("schema".to_string(), "app".to_string())]),
            placeholder_prefix: "#[".to_string(),
            placeholder_suffix: "]".to_string(),
            ..MigrateConfig::default()
        };
        let replacer = config.replacer();
        assert_eq!(
            replacer.replace("SELECT * FROM #[schema].t").unwrap(),
            "SELECT * FROM app.t"
        );
        assert_eq!(replacer.replace("${schema}").unwrap(), "${schema}");
    }

    #[test]
    fn test_default_locations() {
        let config = MigrateConfig::default();
        assert_eq!(config.resolver().locations(), [PathBuf::from("migrations")]);

        let replacer = config.replacer();
        assert!(!replacer.is_identity());
        assert_eq!(replacer.replace("SELECT 1;").unwrap(), "SELECT 1;");
        assert!(replacer.replace("SELECT ${missing};").is_err());
    }
}
