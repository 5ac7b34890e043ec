//! # Ratchet
//!
//! Forward-only SQL migrations with drift reconciliation.
//!
//! Ratchet provides:
//! - A directory of `<timestamp>_<description>.sql` files as the migration catalog
//! - A ledger table recording which migrations have been committed
//! - A three-way classification of every migration as committed, pending or missing
//! - Ordered application where each migration and its ledger record commit together
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ratchet::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = LedgerTable::parse("public.migrations")?;
//!     let store = PgStore::connect_url("postgresql://localhost/mydb", table).await?;
//!
//!     let config = MigrationConfig::new().migrations_dir("migrations");
//!     let mut engine = MigrationEngine::new(config, store);
//!
//!     let status = engine.status().await?;
//!     if status.has_missing() {
//!         eprintln!("ledger references migrations that are no longer on disk");
//!     }
//!
//!     let report = engine.migrate().await;
//!     engine.close().await;
//!     println!("{}", report?.summary());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration engine: catalog loading, reconciliation and apply.
pub mod migrate {
    pub use ratchet_migrate::*;
}

/// PostgreSQL ledger store.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres {
    pub use ratchet_postgres::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        ApplyReport, MemoryStore, Migration, MigrationConfig, MigrationEngine, MigrationError,
        MigrationId, MigrationState, MigrationStore, Reconciliation, reconcile, redate,
    };
    #[cfg(feature = "postgres")]
    pub use crate::postgres::{LedgerTable, PgConfig, PgStore};
}

// Re-export key types at the crate root
pub use ratchet_migrate::{MigrateResult, MigrationError};
