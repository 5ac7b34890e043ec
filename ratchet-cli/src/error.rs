//! CLI error types and result alias.

use miette::Diagnostic;
use ratchet_migrate::MigrationError;
use ratchet_postgres::PgError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(ratchet::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(ratchet::config))]
    Config(String),

    /// A required positional argument was not given
    #[error("{0}")]
    #[diagnostic(code(ratchet::usage))]
    MissingArgument(&'static str),

    /// No connection URL from any source
    #[error("No database URL configured")]
    #[diagnostic(
        code(ratchet::config),
        help("Set DATABASE_URL, pass --database-url, or add `url` under [database] in ratchet.toml")
    )]
    MissingDatabaseUrl,

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(ratchet::database))]
    Database(String),

    /// A migration body failed during `up`
    #[error(transparent)]
    #[diagnostic(
        code(ratchet::apply),
        help("Run `ratchet check` to inspect migration drift")
    )]
    Apply(MigrationError),

    /// Any other migration engine error
    #[error(transparent)]
    #[diagnostic(code(ratchet::migration))]
    Migration(MigrationError),

    /// `check --fail` found pending or missing migrations
    #[error("Migration drift detected: {pending} pending, {missing} missing")]
    #[diagnostic(code(ratchet::drift))]
    Drift {
        /// Number of pending migrations.
        pending: usize,
        /// Number of missing migrations.
        missing: usize,
    },
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::Apply { .. } => CliError::Apply(err),
            other => CliError::Migration(other),
        }
    }
}

impl From<PgError> for CliError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Config(msg) => CliError::Config(msg),
            other => CliError::Database(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}
