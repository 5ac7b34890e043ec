//! CLI command implementations.

pub mod check;
pub mod help;
pub mod new;
pub mod redate;
pub mod up;

use ratchet_migrate::{MigrationConfig, MigrationEngine};
use ratchet_postgres::{LedgerTable, PgStore};
use tracing::debug;

use crate::config::Settings;
use crate::error::CliResult;

/// Connect to the configured database and wrap the store in an engine.
pub(crate) async fn open_engine(settings: &Settings) -> CliResult<MigrationEngine<PgStore>> {
    let url = settings.require_database_url()?;
    let table = LedgerTable::parse(&settings.table)?;

    debug!(table = %table, dir = %settings.migrations_dir.display(), "Opening migration engine");
    let store = PgStore::connect_url(url, table).await?;

    let config = MigrationConfig::new()
        .migrations_dir(&settings.migrations_dir)
        .use_lock(settings.use_lock);

    Ok(MigrationEngine::new(config, store))
}
