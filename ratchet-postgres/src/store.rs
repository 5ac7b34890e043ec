//! Migration store backed by a single PostgreSQL connection.

use chrono::{DateTime, Utc};
use ratchet_migrate::{
    MigrateResult, MigrationError, MigrationId, MigrationRecord, MigrationStore, StoreTransaction,
};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, Row, Transaction};
use tracing::{debug, error, warn};

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};
use crate::ledger::LedgerTable;

/// A [`MigrationStore`] that keeps its ledger in a PostgreSQL table.
pub struct PgStore {
    client: Client,
    connection: JoinHandle<()>,
    table: LedgerTable,
}

impl PgStore {
    /// Open a connection and bind it to `table`.
    pub async fn connect(config: &PgConfig, table: LedgerTable) -> PgResult<Self> {
        debug!(target_db = %config.display_target(), table = %table, "Connecting");

        let (client, connection) = config.to_pg_config().connect(NoTls).await.map_err(|e| {
            PgError::connection(format!(
                "failed to connect to {}: {}",
                config.display_target(),
                e
            ))
        })?;

        // Spawn the connection handler
        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Connection error");
            }
        });

        Ok(Self {
            client,
            connection,
            table,
        })
    }

    /// Connect using a database URL.
    pub async fn connect_url(url: &str, table: LedgerTable) -> PgResult<Self> {
        let config = PgConfig::from_url(url)?;
        Self::connect(&config, table).await
    }

    /// The ledger table this store writes to.
    pub fn table(&self) -> &LedgerTable {
        &self.table
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn db_error(err: tokio_postgres::Error) -> MigrationError {
    PgError::from(err).into()
}

fn record_from_row(row: &Row) -> PgResult<MigrationRecord> {
    let id: String = row.try_get(0)?;
    let description: String = row.try_get(1)?;
    let applied_at: DateTime<Utc> = row.try_get(2)?;

    let id: MigrationId = id
        .parse()
        .map_err(|_| PgError::ledger(format!("identity '{}' is not a run of digits", id)))?;

    Ok(MigrationRecord {
        id,
        description,
        applied_at,
    })
}

#[async_trait::async_trait]
impl MigrationStore for PgStore {
    async fn initialize(&mut self) -> MigrateResult<()> {
        let sql = self.table.create_sql();
        debug!(sql = %sql, "Initializing ledger");
        self.client.batch_execute(&sql).await.map_err(db_error)
    }

    async fn list_records(&mut self) -> MigrateResult<Vec<MigrationRecord>> {
        let sql = self.table.select_sql();
        debug!(sql = %sql, "Listing ledger");
        let rows = self.client.query(&sql, &[]).await.map_err(db_error)?;

        rows.iter()
            .map(|row| record_from_row(row).map_err(MigrationError::from))
            .collect()
    }

    async fn begin<'a>(&'a mut self) -> MigrateResult<Box<dyn StoreTransaction + 'a>> {
        let insert_sql = self.table.insert_sql();
        let txn = self.client.transaction().await.map_err(db_error)?;
        Ok(Box::new(PgStoreTransaction {
            txn: Some(txn),
            insert_sql,
        }))
    }

    async fn acquire_lock(&mut self) -> MigrateResult<()> {
        let key = self.table.lock_key();
        debug!(key, "Waiting for migration lock");
        self.client
            .execute("SELECT pg_advisory_lock($1)", &[&key])
            .await
            .map_err(|e| MigrationError::lock_failed(PgError::from(e).to_string()))?;
        Ok(())
    }

    async fn release_lock(&mut self) -> MigrateResult<()> {
        let key = self.table.lock_key();
        self.client
            .execute("SELECT pg_advisory_unlock($1)", &[&key])
            .await
            .map_err(db_error)?;
        debug!(key, "Released migration lock");
        Ok(())
    }

    async fn close(self) {
        drop(self.client);
        if let Err(e) = self.connection.await {
            warn!(error = %e, "Connection task did not shut down cleanly");
        }
    }
}

/// One migration's transaction on a [`PgStore`].
///
/// Dropping it before [`StoreTransaction::commit`] rolls back.
pub struct PgStoreTransaction<'a> {
    txn: Option<Transaction<'a>>,
    insert_sql: String,
}

impl<'a> PgStoreTransaction<'a> {
    fn active(&self) -> MigrateResult<&Transaction<'a>> {
        self.txn
            .as_ref()
            .ok_or_else(|| MigrationError::database("transaction already finished"))
    }
}

#[async_trait::async_trait]
impl<'a> StoreTransaction for PgStoreTransaction<'a> {
    async fn execute(&mut self, script: &str) -> MigrateResult<()> {
        debug!(bytes = script.len(), "Executing migration body");
        self.active()?.batch_execute(script).await.map_err(db_error)
    }

    async fn insert_record(&mut self, id: MigrationId, description: &str) -> MigrateResult<()> {
        let id = id.to_string();
        self.active()?
            .execute(self.insert_sql.as_str(), &[&id, &description])
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn commit(&mut self) -> MigrateResult<()> {
        match self.txn.take() {
            Some(txn) => txn.commit().await.map_err(db_error),
            None => Err(MigrationError::database("transaction already finished")),
        }
    }

    async fn rollback(&mut self) -> MigrateResult<()> {
        match self.txn.take() {
            Some(txn) => txn.rollback().await.map_err(db_error),
            None => Ok(()),
        }
    }
}
