//! Re-stamping migration files with a fresh identity.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::file::{MigrationName, find_identity};
use crate::identity::MigrationId;

/// Rename the migration at `path` to carry the current timestamp as its identity.
///
/// The description and extension are kept and the file stays in its directory.
/// Returns the new path.
pub async fn redate(path: impl AsRef<Path>) -> MigrateResult<PathBuf> {
    redate_with_id(path, MigrationId::now()).await
}

/// Rename the migration at `path` to carry `id` as its identity.
///
/// Fails with [`MigrationError::AlreadyExists`] if any migration in the same
/// directory already uses `id`, whatever its description. An existing file is
/// never overwritten.
pub async fn redate_with_id(path: impl AsRef<Path>, id: MigrationId) -> MigrateResult<PathBuf> {
    let source = path.as_ref();

    if !tokio::fs::try_exists(source).await? {
        return Err(MigrationError::NotFound(source.to_path_buf()));
    }

    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MigrationError::invalid_name(source.display().to_string()))?;
    let name = MigrationName::parse(file_name)?;

    let dir = match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if let Some(existing) = find_identity(dir, id).await? {
        return Err(MigrationError::AlreadyExists(existing));
    }

    let destination = source.with_file_name(name.with_id(id).file_name());

    // Linking fails if the destination appeared since the scan.
    match tokio::fs::hard_link(source, &destination).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(MigrationError::AlreadyExists(destination));
        }
        Err(e) => return Err(e.into()),
    }

    if let Err(e) = tokio::fs::remove_file(source).await {
        if let Err(undo) = tokio::fs::remove_file(&destination).await {
            warn!(path = %destination.display(), error = %undo, "Failed to remove new link");
        }
        return Err(e.into());
    }

    info!(
        from = %source.display(),
        to = %destination.display(),
        "Redated migration"
    );

    Ok(destination)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::identity::TIMESTAMP_WIDTH;

    #[tokio::test]
    async fn test_redate_keeps_description() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("001_a");
        std::fs::write(&source, "SELECT 1;").unwrap();

        let before = MigrationId::now();
        let destination = redate(&source).await.unwrap();

        assert!(!source.exists());
        assert!(destination.exists());
        assert_eq!(destination.parent(), Some(dir.path()));

        let name = destination.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_a"));
        let parsed = MigrationName::parse(name).unwrap();
        assert_eq!(parsed.id.width(), TIMESTAMP_WIDTH);
        assert!(parsed.id >= before);
        assert_eq!(std::fs::read_to_string(destination).unwrap(), "SELECT 1;");
    }

    #[tokio::test]
    async fn test_redate_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("20240101120000_add_users.sql");
        std::fs::write(&source, "").unwrap();

        let id: MigrationId = "20250102030405".parse().unwrap();
        let destination = redate_with_id(&source, id).await.unwrap();

        assert_eq!(destination, dir.path().join("20250102030405_add_users.sql"));
    }

    #[tokio::test]
    async fn test_redate_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = redate(dir.path().join("001_gone")).await.unwrap_err();
        assert!(matches!(err, MigrationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_redate_collision() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("001_a.sql");
        std::fs::write(&source, "first").unwrap();
        std::fs::write(dir.path().join("002_a.sql"), "second").unwrap();

        let err = redate_with_id(&source, "002".parse().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::AlreadyExists(_)));
        assert_eq!(std::fs::read_to_string(&source).unwrap(), "first");
    }

    #[tokio::test]
    async fn test_redate_refuses_identity_in_use() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("001_a.sql");
        let second = dir.path().join("002_b.sql");
        std::fs::write(&first, "SELECT 1;").unwrap();
        std::fs::write(&second, "SELECT 2;").unwrap();
        let stamp: MigrationId = "20260101000000".parse().unwrap();

        let moved = redate_with_id(&first, stamp).await.unwrap();
        assert_eq!(moved, dir.path().join("20260101000000_a.sql"));

        let err = redate_with_id(&second, stamp).await.unwrap_err();
        match err {
            MigrationError::AlreadyExists(path) => assert_eq!(path, moved),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "SELECT 2;");
        assert!(!dir.path().join("20260101000000_b.sql").exists());
        assert_eq!(
            crate::file::MigrationFileManager::new(dir.path())
                .load()
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_redate_rejects_bad_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "").unwrap();

        let err = redate(&source).await.unwrap_err();
        assert!(matches!(err, MigrationError::InvalidName(_)));
        assert!(source.exists());
    }
}
