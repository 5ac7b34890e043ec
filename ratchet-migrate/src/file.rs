//! Migration file discovery, parsing, and creation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Utc;
use regex_lite::Regex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MigrateResult, MigrationError};
use crate::identity::MigrationId;

/// Extension given to migration files created by [`MigrationFileManager::create`].
pub const MIGRATION_EXTENSION: &str = "sql";

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)_(.+?)(?:\.([A-Za-z0-9]+))?$").expect("migration name pattern is valid")
});

/// A migration loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Identity parsed from the file name prefix.
    pub id: MigrationId,
    /// Human readable part of the file name.
    pub description: String,
    /// Path the migration was loaded from.
    pub path: PathBuf,
    /// SQL executed when the migration is applied.
    pub body: String,
}

/// The parts of a migration file name: `<id>_<description>[.<extension>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationName {
    /// Digit prefix.
    pub id: MigrationId,
    /// Text between the first `_` and the extension.
    pub description: String,
    /// Trailing extension without the dot, if any.
    pub extension: Option<String>,
}

impl MigrationName {
    /// Parse a bare file name (no directory components).
    pub fn parse(file_name: &str) -> MigrateResult<Self> {
        let caps = NAME_PATTERN.captures(file_name).ok_or_else(|| {
            MigrationError::invalid_name(format!(
                "'{}' does not match <digits>_<description>[.ext]",
                file_name
            ))
        })?;

        let id = caps[1].parse()?;
        let description = caps[2].to_string();
        let extension = caps.get(3).map(|m| m.as_str().to_string());

        Ok(Self {
            id,
            description,
            extension,
        })
    }

    /// Same description and extension under a different identity.
    pub fn with_id(&self, id: MigrationId) -> Self {
        Self {
            id,
            description: self.description.clone(),
            extension: self.extension.clone(),
        }
    }

    /// Render back to a file name.
    pub fn file_name(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}_{}.{}", self.id, self.description, ext),
            None => format!("{}_{}", self.id, self.description),
        }
    }
}

/// Reads and writes migration files in one directory.
#[derive(Debug, Clone)]
pub struct MigrationFileManager {
    migrations_dir: PathBuf,
}

impl MigrationFileManager {
    /// Create a new file manager.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Ensure the migrations directory exists.
    pub async fn ensure_dir(&self) -> MigrateResult<()> {
        tokio::fs::create_dir_all(&self.migrations_dir).await?;
        Ok(())
    }

    /// Path a migration with this identity and description would be created at.
    pub fn expected_path(&self, id: MigrationId, description: &str) -> PathBuf {
        self.migrations_dir
            .join(format!("{}_{}.{}", id, description, MIGRATION_EXTENSION))
    }

    /// Load every migration in the directory, ordered by identity.
    ///
    /// Entries are visited in file name order. The first entry that is not a
    /// readable file with a well-formed name aborts the whole load, as does a
    /// repeated identity. Hidden entries are skipped.
    pub async fn load(&self) -> MigrateResult<Vec<Migration>> {
        let dir = &self.migrations_dir;

        if !tokio::fs::try_exists(dir).await? {
            return Err(MigrationError::load(
                dir,
                "migrations directory does not exist",
            ));
        }

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| MigrationError::load(dir, e.to_string()))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MigrationError::load(dir, e.to_string()))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                return Err(MigrationError::load(
                    entry.path(),
                    "file name is not valid UTF-8",
                ));
            };

            if name.starts_with('.') {
                debug!(name = %name, "Skipping hidden entry");
                continue;
            }

            names.push(name.to_string());
        }

        names.sort();
        debug!(dir = %dir.display(), count = names.len(), "Scanned migrations directory");

        let mut migrations = Vec::with_capacity(names.len());
        let mut seen: HashMap<MigrationId, PathBuf> = HashMap::new();

        for name in names {
            let path = dir.join(&name);
            let migration = read_migration(&path, &name).await?;

            if let Some(first) = seen.insert(migration.id, path.clone()) {
                return Err(MigrationError::DuplicateId {
                    id: migration.id,
                    first,
                    second: path,
                });
            }

            migrations.push(migration);
        }

        // File name order already matches identity order for equal-width prefixes.
        migrations.sort_by_key(|m| m.id);

        Ok(migrations)
    }

    /// Create an empty migration stamped with the current time.
    pub async fn create(&self, name: &str) -> MigrateResult<PathBuf> {
        self.create_with_id(name, MigrationId::now()).await
    }

    /// Create an empty migration with an explicit identity.
    pub async fn create_with_id(&self, name: &str, id: MigrationId) -> MigrateResult<PathBuf> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(MigrationError::invalid_name(format!(
                "'{}' has no usable characters",
                name
            )));
        }

        self.ensure_dir().await?;

        if let Some(existing) = find_identity(&self.migrations_dir, id).await? {
            return Err(MigrationError::AlreadyExists(existing));
        }

        let path = self.expected_path(id, &slug);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(MigrationError::AlreadyExists(path));
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(stub_contents(name).as_bytes()).await?;
        file.flush().await?;

        info!(path = %path.display(), "Created migration");
        Ok(path)
    }
}

/// First entry in `dir` whose file name carries `id`.
///
/// Entries that are hidden or do not parse as migration names are ignored.
pub(crate) async fn find_identity(dir: &Path, id: MigrationId) -> MigrateResult<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if MigrationName::parse(name).is_ok_and(|n| n.id == id) {
            return Ok(Some(entry.path()));
        }
    }

    Ok(None)
}

async fn read_migration(path: &Path, file_name: &str) -> MigrateResult<Migration> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| MigrationError::load(path, e.to_string()))?;
    if !metadata.is_file() {
        return Err(MigrationError::load(path, "not a regular file"));
    }

    let name = MigrationName::parse(file_name)
        .map_err(|e| MigrationError::load(path, e.to_string()))?;

    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MigrationError::load(path, e.to_string()))?;

    Ok(Migration {
        id: name.id,
        description: name.description,
        path: path.to_path_buf(),
        body,
    })
}

/// Lowercase `name`, collapsing every run of other characters into `_`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    slug
}

fn stub_contents(name: &str) -> String {
    let name: String = name.chars().filter(|c| !c.is_control()).collect();
    format!(
        "-- Migration: {}\n\
         -- Created: {}\n\
         --\n\
         -- This script runs in one transaction with its ledger record.\n\
         -- Keep it safe to re-run: anything outside that transaction may\n\
         -- execute again if an earlier attempt was interrupted.\n\n",
        name,
        Utc::now().to_rfc3339()
    )
}
