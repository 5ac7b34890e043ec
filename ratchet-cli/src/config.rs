//! CLI configuration handling.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use ratchet_postgres::DEFAULT_LEDGER_TABLE;

use crate::cli::GlobalArgs;
use crate::error::{CliError, CliResult};

/// Default config file name (lives in the working directory)
pub const CONFIG_FILE_NAME: &str = "ratchet.toml";

/// Default migrations directory (relative to the working directory)
pub const MIGRATIONS_DIR: &str = "migrations";

/// Contents of `ratchet.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file named by `--config`, else `ratchet.toml` if present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(CONFIG_FILE_NAME);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    /// Directory for migration files
    pub directory: PathBuf,

    /// Ledger table name, `[schema.]table`
    pub table: String,

    /// Hold the advisory lock while applying
    pub lock: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(MIGRATIONS_DIR),
            table: DEFAULT_LEDGER_TABLE.to_string(),
            lock: true,
        }
    }
}

/// Effective settings after layering flags and environment over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding migration files.
    pub migrations_dir: PathBuf,
    /// Ledger table name.
    pub table: String,
    /// Connection URL, if any source provided one.
    pub database_url: Option<String>,
    /// Whether `up` takes the advisory lock.
    pub use_lock: bool,
}

impl Settings {
    /// Layer command-line values over `config`.
    pub fn resolve(args: &GlobalArgs, config: Config) -> Self {
        Self {
            migrations_dir: args
                .dir
                .clone()
                .unwrap_or(config.migrations.directory),
            table: args.table.clone().unwrap_or(config.migrations.table),
            database_url: args.database_url.clone().or(config.database.url),
            use_lock: !args.no_lock && config.migrations.lock,
        }
    }

    /// The connection URL, or an error naming where to set it.
    pub fn require_database_url(&self) -> CliResult<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(CliError::MissingDatabaseUrl)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.migrations.directory, PathBuf::from("migrations"));
        assert_eq!(config.migrations.table, "public.migrations");
        assert!(config.migrations.lock);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_config_parse() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "postgresql://localhost/app"

            [migrations]
            directory = "db/migrations"
            lock = false
            "#,
        )
        .unwrap();

        assert_eq!(config.database.url.as_deref(), Some("postgresql://localhost/app"));
        assert_eq!(config.migrations.directory, PathBuf::from("db/migrations"));
        assert_eq!(config.migrations.table, "public.migrations");
        assert!(!config.migrations.lock);
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let result: Result<Config, _> = toml::from_str("[migrations]\ndir = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[migrations]\ntable = \"ops.ledger\"\n").unwrap();

        let config = Config::discover(Some(&path)).unwrap();
        assert_eq!(config.migrations.table, "ops.ledger");
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = TempDir::new().unwrap();
        let result = Config::discover(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_flags_override_config() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "postgresql://localhost/from_file"

            [migrations]
            directory = "from_file"
            table = "file.ledger"
            "#,
        )
        .unwrap();

        let args = GlobalArgs {
            dir: Some(PathBuf::from("from_flag")),
            no_lock: true,
            ..GlobalArgs::default()
        };

        let settings = Settings::resolve(&args, config);
        assert_eq!(
            settings,
            Settings {
                migrations_dir: PathBuf::from("from_flag"),
                table: "file.ledger".to_string(),
                database_url: Some("postgresql://localhost/from_file".to_string()),
                use_lock: false,
            }
        );
    }

    #[test]
    fn test_require_database_url() {
        let settings = Settings::resolve(&GlobalArgs::default(), Config::default());
        assert!(matches!(
            settings.require_database_url(),
            Err(CliError::MissingDatabaseUrl)
        ));

        let args = GlobalArgs {
            database_url: Some("postgresql://localhost/app".to_string()),
            ..GlobalArgs::default()
        };
        let settings = Settings::resolve(&args, Config::default());
        assert_eq!(
            settings.require_database_url().unwrap(),
            "postgresql://localhost/app"
        );
    }
}
