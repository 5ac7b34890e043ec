//! # ratchet-migrate
//!
//! Migration engine for Ratchet.
//!
//! This crate provides functionality for:
//! - Loading a directory of migration files into an ordered catalog
//! - Reconciling the catalog with the ledger of committed migrations
//! - Applying pending migrations in order, one transactional unit each
//! - Re-stamping migration files with a fresh identity
//! - Creating stub migration files
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ migrations/  │────▶│ File Loader    │────▶│ Catalog     │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                                                    │
//!                                                    ▼
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ Ledger Table │────▶│ Reconcile      │◀────│ Catalog     │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                              │
//!                  ┌───────────┴───────────┐
//!                  ▼                       ▼
//!          ┌───────────────┐       ┌───────────────┐
//!          │ check report  │       │ apply pending │
//!          └───────────────┘       └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use ratchet_migrate::{MemoryStore, MigrationConfig, MigrationEngine};
//!
//! async fn run_migrations() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MigrationConfig::new().migrations_dir("./migrations");
//!     let mut engine = MigrationEngine::new(config, MemoryStore::new());
//!
//!     let status = engine.status().await?;
//!     for entry in status.migrations() {
//!         println!("{}: {}, {}", entry.state.code(), entry.id, entry.description);
//!     }
//!
//!     let report = engine.migrate().await?;
//!     println!("{}", report.summary());
//!
//!     engine.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Migration Files
//!
//! Each migration is a single file named `<digits>_<description>[.ext]`:
//!
//! ```text
//! migrations/
//! ├── 20231215120000_create_users.sql
//! └── 20231216090000_add_posts.sql
//! ```
//!
//! ## Retries
//!
//! A body and its ledger record commit together. If the process dies after a
//! body ran but before its unit committed, the next run executes that body
//! again. Migration bodies must therefore be safe to repeat.

pub mod engine;
pub mod error;
pub mod file;
pub mod history;
pub mod identity;
pub mod memory;
pub mod reconcile;
pub mod redate;

// Re-exports
pub use engine::{ApplyReport, MigrationConfig, MigrationEngine, apply_pending};
pub use error::{MigrateResult, MigrationError};
pub use file::{MIGRATION_EXTENSION, Migration, MigrationFileManager, MigrationName};
pub use history::{MigrationRecord, MigrationStore, StoreTransaction};
pub use identity::{MigrationId, TIMESTAMP_WIDTH};
pub use memory::MemoryStore;
pub use reconcile::{
    CandidateStatus, MigrationState, ReconciledMigration, Reconciliation, reconcile,
};
pub use redate::{redate, redate_with_id};
