//! Migration engine implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::file::{Migration, MigrationFileManager};
use crate::history::{MigrationStore, StoreTransaction};
use crate::identity::MigrationId;
use crate::reconcile::{Reconciliation, reconcile};

/// Configuration for the migration engine.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Path to the migrations directory.
    pub migrations_dir: PathBuf,
    /// Whether `migrate` holds the store's run lock while applying.
    pub use_lock: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            use_lock: true,
        }
    }
}

impl MigrationConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the migrations directory.
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    /// Enable or disable the run lock.
    pub fn use_lock(mut self, use_lock: bool) -> Self {
        self.use_lock = use_lock;
        self
    }
}

/// Result of applying pending migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Identities committed by this run, in the order they were applied.
    pub applied: Vec<MigrationId>,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl ApplyReport {
    /// Number of migrations applied.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Whether anything was applied.
    pub fn has_changes(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        match self.applied.len() {
            0 => "No pending migrations".to_string(),
            1 => format!("Applied 1 migration in {}ms", self.duration_ms),
            n => format!("Applied {} migrations in {}ms", n, self.duration_ms),
        }
    }
}

/// Apply every pending migration in `catalog`, oldest first.
///
/// `catalog` may be in any order; pending migrations are applied in
/// identity order.
///
/// Each migration runs in its own transactional unit together with its ledger
/// record. The first failure rolls back that unit and stops the run; units
/// committed before it stay committed.
///
/// A body that already ran but whose unit never committed runs again on the
/// next call, so bodies must be safe to repeat.
pub async fn apply_pending<S>(catalog: &[Migration], store: &mut S) -> MigrateResult<ApplyReport>
where
    S: MigrationStore,
{
    let start = Instant::now();
    let records = store.list_records().await?;
    let status = reconcile(catalog, &records);

    for late in status.out_of_order() {
        warn!(
            id = %late.id,
            description = %late.description,
            "Pending migration is older than the newest committed one"
        );
    }

    let by_id: HashMap<MigrationId, &Migration> = catalog.iter().map(|m| (m.id, m)).collect();
    let pending: Vec<&Migration> = status
        .pending()
        .filter_map(|m| by_id.get(&m.id).copied())
        .collect();
    debug!(count = pending.len(), "Pending migrations");

    let mut report = ApplyReport::default();

    for migration in pending {
        info!(id = %migration.id, description = %migration.description, "Applying migration");
        let migration_start = Instant::now();

        apply_one(store, migration)
            .await
            .map_err(|e| MigrationError::apply(migration.id, &migration.description, e))?;

        info!(
            id = %migration.id,
            elapsed_ms = migration_start.elapsed().as_millis() as u64,
            "Applied migration"
        );
        report.applied.push(migration.id);
    }

    report.duration_ms = start.elapsed().as_millis() as i64;
    Ok(report)
}

async fn apply_one<S>(store: &mut S, migration: &Migration) -> MigrateResult<()>
where
    S: MigrationStore,
{
    let mut txn = store.begin().await?;

    if let Err(e) = run_unit(txn.as_mut(), migration).await {
        if let Err(rollback) = txn.rollback().await {
            warn!(id = %migration.id, error = %rollback, "Rollback failed");
        }
        return Err(e);
    }

    Ok(())
}

async fn run_unit(
    txn: &mut (dyn StoreTransaction + '_),
    migration: &Migration,
) -> MigrateResult<()> {
    txn.execute(&migration.body).await?;
    txn.insert_record(migration.id, &migration.description).await?;
    txn.commit().await
}

/// The main migration engine.
pub struct MigrationEngine<S: MigrationStore> {
    config: MigrationConfig,
    store: S,
    file_manager: MigrationFileManager,
}

impl<S: MigrationStore> MigrationEngine<S> {
    /// Create a new migration engine.
    pub fn new(config: MigrationConfig, store: S) -> Self {
        let file_manager = MigrationFileManager::new(&config.migrations_dir);
        Self {
            config,
            store,
            file_manager,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Get the file manager.
    pub fn files(&self) -> &MigrationFileManager {
        &self.file_manager
    }

    /// Get the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the migration catalog from disk.
    pub async fn load(&self) -> MigrateResult<Vec<Migration>> {
        self.file_manager.load().await
    }

    /// Reconcile files on disk with the ledger.
    pub async fn status(&mut self) -> MigrateResult<Reconciliation> {
        let catalog = self.load().await?;
        self.store.initialize().await?;
        let records = self.store.list_records().await?;
        Ok(reconcile(&catalog, &records))
    }

    /// Apply pending migrations.
    ///
    /// The catalog is loaded before the store is touched, so a bad file
    /// aborts the run without applying anything. The ledger is initialized
    /// under the run lock.
    pub async fn migrate(&mut self) -> MigrateResult<ApplyReport> {
        let catalog = self.load().await?;

        if !self.config.use_lock {
            self.store.initialize().await?;
            return apply_pending(&catalog, &mut self.store).await;
        }

        self.store.acquire_lock().await?;
        let result = match self.store.initialize().await {
            Ok(()) => apply_pending(&catalog, &mut self.store).await,
            Err(e) => Err(e),
        };
        let released = self.store.release_lock().await;

        match (result, released) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), released) => {
                if let Err(release_err) = released {
                    warn!(error = %release_err, "Failed to release migration lock");
                }
                Err(e)
            }
        }
    }

    /// Release the store.
    pub async fn close(self) {
        self.store.close().await;
    }

    /// Take the store back out of the engine.
    pub fn into_store(self) -> S {
        self.store
    }
}
