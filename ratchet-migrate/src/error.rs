//! Error types for the migration engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::identity::MigrationId;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record store or driver error.
    #[error("Database error: {0}")]
    Database(String),

    /// A migration file could not be loaded into the catalog.
    #[error("Failed to load migration '{}': {reason}", .path.display())]
    Load {
        /// Offending file.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Two files in the catalog carry the same identity.
    #[error(
        "Duplicate migration identity {id}: '{}' and '{}'",
        .first.display(),
        .second.display()
    )]
    DuplicateId {
        /// Shared identity.
        id: MigrationId,
        /// File that claimed the identity first.
        first: PathBuf,
        /// File that repeated it.
        second: PathBuf,
    },

    /// A migration body failed while being applied.
    #[error("Migration {id} ({description}) failed")]
    Apply {
        /// Identity of the failed migration.
        id: MigrationId,
        /// Description of the failed migration.
        description: String,
        /// Underlying store error.
        #[source]
        cause: Box<MigrationError>,
    },

    /// A path that must exist does not.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A path that must not exist does.
    #[error("Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A file name or identity that does not follow the migration naming scheme.
    #[error("Invalid migration name: {0}")]
    InvalidName(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire migration lock: {0}")]
    LockFailed(String),
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a load error for `path`.
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    /// Create a lock failed error.
    pub fn lock_failed(msg: impl Into<String>) -> Self {
        Self::LockFailed(msg.into())
    }

    /// Wrap a store error raised while applying the given migration.
    pub fn apply(id: MigrationId, description: impl Into<String>, cause: MigrationError) -> Self {
        Self::Apply {
            id,
            description: description.into(),
            cause: Box::new(cause),
        }
    }

    /// Check if this error was raised while loading the catalog.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::Load { .. } | Self::DuplicateId { .. })
    }

    /// The identity of the migration that failed to apply, if any.
    pub fn failed_migration(&self) -> Option<MigrationId> {
        match self {
            Self::Apply { id, .. } => Some(*id),
            _ => None,
        }
    }
}
