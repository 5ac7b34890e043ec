//! Ledger table naming and the SQL issued against it.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::{PgError, PgResult};

/// Ledger table used when none is configured.
pub const DEFAULT_LEDGER_TABLE: &str = "public.migrations";

/// A validated `[schema.]table` name for the migration ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTable {
    schema: Option<String>,
    table: String,
}

impl LedgerTable {
    /// Parse and validate a `[schema.]table` name.
    pub fn parse(name: &str) -> PgResult<Self> {
        let (schema, table) = match name.split_once('.') {
            Some((schema, table)) => (Some(schema), table),
            None => (None, name),
        };

        if let Some(schema) = schema {
            validate_identifier(schema, name)?;
        }
        validate_identifier(table, name)?;

        Ok(Self {
            schema: schema.map(String::from),
            table: table.to_string(),
        })
    }

    /// Schema part, if given.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Table part.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Quoted name for use in SQL.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("\"{}\".\"{}\"", schema, self.table),
            None => format!("\"{}\"", self.table),
        }
    }

    /// Statements that create the ledger if it does not exist.
    pub fn create_sql(&self) -> String {
        let mut sql = String::new();
        if let Some(schema) = &self.schema {
            sql.push_str(&format!("CREATE SCHEMA IF NOT EXISTS \"{}\";\n", schema));
        }
        sql.push_str(&format!(
            r#"CREATE TABLE IF NOT EXISTS {} (
    id TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
);"#,
            self.qualified()
        ));
        sql
    }

    /// Query returning every committed migration.
    pub fn select_sql(&self) -> String {
        format!(
            "SELECT id, description, applied_at FROM {} ORDER BY id",
            self.qualified()
        )
    }

    /// Statement recording one committed migration (`$1` id, `$2` description).
    pub fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (id, description) VALUES ($1, $2)",
            self.qualified()
        )
    }

    /// Advisory lock key shared by every runner using this ledger.
    ///
    /// The first eight bytes of the SHA-256 of the unquoted name.
    pub fn lock_key(&self) -> i64 {
        let digest = Sha256::digest(self.to_string().as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        i64::from_be_bytes(bytes)
    }
}

impl Default for LedgerTable {
    fn default() -> Self {
        Self {
            schema: Some("public".to_string()),
            table: "migrations".to_string(),
        }
    }
}

impl fmt::Display for LedgerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => f.write_str(&self.table),
        }
    }
}

impl FromStr for LedgerTable {
    type Err = PgError;

    fn from_str(s: &str) -> PgResult<Self> {
        Self::parse(s)
    }
}

fn validate_identifier(ident: &str, full: &str) -> PgResult<()> {
    let mut chars = ident.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    // PostgreSQL truncates identifiers beyond NAMEDATALEN - 1 bytes.
    if !valid_start || !valid_rest || ident.len() > 63 {
        return Err(PgError::config(format!(
            "invalid ledger table name '{}': expected [schema.]table with letters, digits and underscores",
            full
        )));
    }
    Ok(())
}
