//! Migration ledger records and the store interface the engine drives.

use chrono::{DateTime, Utc};

use crate::error::MigrateResult;
use crate::identity::MigrationId;

/// A record of a committed migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Identity of the committed migration.
    pub id: MigrationId,
    /// Description the migration had when it was applied.
    pub description: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

impl MigrationRecord {
    /// Create a record stamped with the current time.
    pub fn new(id: MigrationId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            applied_at: Utc::now(),
        }
    }
}

/// Persistent ledger of committed migrations.
///
/// Implementations own a single connection. Records are append-only: nothing
/// here deletes or rewrites one.
#[async_trait::async_trait]
pub trait MigrationStore: Send {
    /// Create the ledger if it does not exist yet.
    async fn initialize(&mut self) -> MigrateResult<()>;

    /// Every committed migration.
    async fn list_records(&mut self) -> MigrateResult<Vec<MigrationRecord>>;

    /// Open a transactional unit.
    ///
    /// Dropping the unit without calling [`StoreTransaction::commit`] must
    /// discard everything done through it.
    async fn begin<'a>(&'a mut self) -> MigrateResult<Box<dyn StoreTransaction + 'a>>;

    /// Serialize migration runs against this ledger across processes.
    ///
    /// Stores without cross-process locking keep the default no-op.
    async fn acquire_lock(&mut self) -> MigrateResult<()> {
        Ok(())
    }

    /// Release a lock taken by [`MigrationStore::acquire_lock`].
    async fn release_lock(&mut self) -> MigrateResult<()> {
        Ok(())
    }

    /// Release the underlying connection.
    async fn close(self);
}

/// One migration's worth of work against the store.
#[async_trait::async_trait]
pub trait StoreTransaction: Send {
    /// Execute a migration body.
    async fn execute(&mut self, script: &str) -> MigrateResult<()>;

    /// Add a ledger record for `id`.
    async fn insert_record(&mut self, id: MigrationId, description: &str) -> MigrateResult<()>;

    /// Make the body and the record durable together.
    async fn commit(&mut self) -> MigrateResult<()>;

    /// Discard everything done in this unit.
    async fn rollback(&mut self) -> MigrateResult<()>;
}
