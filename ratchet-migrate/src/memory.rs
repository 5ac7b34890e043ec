//! In-memory migration store.
//!
//! Keeps the ledger in a `Vec` and buffers each transactional unit until it is
//! committed, so it honours the same all-or-nothing contract as a database.
//! Bodies are recorded rather than run; [`MemoryStore::fail_on`] makes any
//! body containing a given fragment fail, which is how tests simulate a broken
//! migration.

use crate::error::{MigrateResult, MigrationError};
use crate::history::{MigrationRecord, MigrationStore, StoreTransaction};
use crate::identity::MigrationId;

/// A [`MigrationStore`] that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<MigrationRecord>,
    executed: Vec<String>,
    fail_fragments: Vec<String>,
    initialized: bool,
    initialized_under_lock: bool,
    locked: bool,
    lock_acquisitions: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose ledger already holds the given migrations.
    pub fn with_records<I, D>(records: I) -> Self
    where
        I: IntoIterator<Item = (MigrationId, D)>,
        D: Into<String>,
    {
        Self {
            records: records
                .into_iter()
                .map(|(id, description)| MigrationRecord::new(id, description))
                .collect(),
            ..Self::default()
        }
    }

    /// Fail any body that contains `fragment`.
    pub fn fail_on(mut self, fragment: impl Into<String>) -> Self {
        self.fail_fragments.push(fragment.into());
        self
    }

    /// Committed ledger records, in commit order.
    pub fn records(&self) -> &[MigrationRecord] {
        &self.records
    }

    /// Committed bodies, in commit order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Whether [`MigrationStore::initialize`] has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether [`MigrationStore::initialize`] ran while the run lock was held.
    pub fn initialized_under_lock(&self) -> bool {
        self.initialized_under_lock
    }

    /// Whether the run lock is currently held.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// How many times the run lock has been taken.
    pub fn lock_acquisitions(&self) -> usize {
        self.lock_acquisitions
    }

    fn has_record(&self, id: MigrationId) -> bool {
        self.records.iter().any(|r| r.id == id)
    }
}

#[async_trait::async_trait]
impl MigrationStore for MemoryStore {
    async fn initialize(&mut self) -> MigrateResult<()> {
        self.initialized = true;
        self.initialized_under_lock = self.locked;
        Ok(())
    }

    async fn list_records(&mut self) -> MigrateResult<Vec<MigrationRecord>> {
        Ok(self.records.clone())
    }

    async fn begin<'a>(&'a mut self) -> MigrateResult<Box<dyn StoreTransaction + 'a>> {
        Ok(Box::new(MemoryTransaction {
            store: self,
            scripts: Vec::new(),
            records: Vec::new(),
        }))
    }

    async fn acquire_lock(&mut self) -> MigrateResult<()> {
        if self.locked {
            return Err(MigrationError::lock_failed("lock is already held"));
        }
        self.locked = true;
        self.lock_acquisitions += 1;
        Ok(())
    }

    async fn release_lock(&mut self) -> MigrateResult<()> {
        self.locked = false;
        Ok(())
    }

    async fn close(self) {}
}

struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    scripts: Vec<String>,
    records: Vec<MigrationRecord>,
}

#[async_trait::async_trait]
impl<'a> StoreTransaction for MemoryTransaction<'a> {
    async fn execute(&mut self, script: &str) -> MigrateResult<()> {
        if let Some(fragment) = self
            .store
            .fail_fragments
            .iter()
            .find(|f| script.contains(f.as_str()))
        {
            return Err(MigrationError::database(format!(
                "simulated failure on '{}'",
                fragment
            )));
        }
        self.scripts.push(script.to_string());
        Ok(())
    }

    async fn insert_record(&mut self, id: MigrationId, description: &str) -> MigrateResult<()> {
        if self.store.has_record(id) || self.records.iter().any(|r| r.id == id) {
            return Err(MigrationError::database(format!(
                "duplicate key: migration {} is already recorded",
                id
            )));
        }
        self.records.push(MigrationRecord::new(id, description));
        Ok(())
    }

    async fn commit(&mut self) -> MigrateResult<()> {
        self.store.executed.append(&mut self.scripts);
        self.store.records.append(&mut self.records);
        Ok(())
    }

    async fn rollback(&mut self) -> MigrateResult<()> {
        self.scripts.clear();
        self.records.clear();
        Ok(())
    }
}
