//! Integration tests for the migration workflow.
//!
//! These tests drive the engine end to end over a real migrations directory and
//! the in-memory store.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use ratchet::migrate::MigrationRecord;
use ratchet::prelude::*;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write migration");
}

fn engine(dir: &Path, store: MemoryStore) -> MigrationEngine<MemoryStore> {
    MigrationEngine::new(MigrationConfig::new().migrations_dir(dir), store)
}

fn id(s: &str) -> MigrationId {
    s.parse().expect("valid identity")
}

/// Test the pending scenario: one committed, two waiting
#[tokio::test]
async fn test_up_applies_pending_in_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "001_a.sql", "CREATE TABLE a ();");
    write(dir.path(), "002_b.sql", "CREATE TABLE b ();");
    write(dir.path(), "003_c.sql", "CREATE TABLE c ();");

    let mut engine = engine(dir.path(), MemoryStore::with_records([(id("001"), "a")]));

    let status = engine.status().await.unwrap();
    let states: Vec<(String, MigrationState)> = status
        .migrations()
        .iter()
        .map(|m| (m.id.to_string(), m.state))
        .collect();
    assert_eq!(
        states,
        vec![
            ("001".to_string(), MigrationState::Committed),
            ("002".to_string(), MigrationState::Pending),
            ("003".to_string(), MigrationState::Pending),
        ]
    );
    assert!(status.has_pending());
    assert!(!status.has_missing());

    let report = engine.migrate().await.unwrap();
    assert_eq!(report.applied, vec![id("002"), id("003")]);

    let store = engine.into_store();
    assert_eq!(store.records().len(), 3);
    assert_eq!(store.executed(), ["CREATE TABLE b ();", "CREATE TABLE c ();"]);
}

/// Test that a second run finds nothing to do
#[tokio::test]
async fn test_up_twice_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "20240101120000_create_users.sql", "CREATE TABLE users ();");
    write(dir.path(), "20240102120000_create_posts.sql", "CREATE TABLE posts ();");

    let mut engine = engine(dir.path(), MemoryStore::new());

    assert_eq!(engine.migrate().await.unwrap().applied_count(), 2);

    let second = engine.migrate().await.unwrap();
    assert!(!second.has_changes());
    assert_eq!(second.summary(), "No pending migrations");
    assert!(!engine.status().await.unwrap().has_drift());
}

/// Test that a failing body halts the run and records nothing for itself
#[tokio::test]
async fn test_failure_halts_run() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "001_a.sql", "CREATE TABLE a ();");
    write(dir.path(), "002_b.sql", "CREATE TABLE b (); -- FAIL");
    write(dir.path(), "003_c.sql", "CREATE TABLE c ();");

    let mut engine = engine(dir.path(), MemoryStore::new().fail_on("FAIL"));

    let err = engine.migrate().await.unwrap_err();
    assert_eq!(err.failed_migration(), Some(id("002")));
    assert!(err.to_string().contains("002"));

    let status = engine.status().await.unwrap();
    let pending: Vec<MigrationId> = status.pending().map(|m| m.id).collect();
    assert_eq!(pending, vec![id("002"), id("003")]);
}

/// Test the missing scenario and its repair by redating
#[tokio::test]
async fn test_missing_then_redate() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "002_b.sql", "SELECT 2;");

    let store = MemoryStore::with_records([(id("001"), "a"), (id("002"), "b")]);
    let mut engine = engine(dir.path(), store);

    let status = engine.status().await.unwrap();
    assert!(status.has_missing());
    assert!(!status.has_pending());
    let first = &status.migrations()[0];
    assert_eq!(first.id, id("001"));
    assert_eq!(first.state, MigrationState::Missing);

    // An operator restores the lost file under its old name, then redates it.
    write(dir.path(), "001_a.sql", "SELECT 1;");
    let moved = redate(dir.path().join("001_a.sql")).await.unwrap();
    assert!(moved.file_name().unwrap().to_str().unwrap().ends_with("_a.sql"));

    let status = engine.status().await.unwrap();
    let states: Vec<MigrationState> = status.migrations().iter().map(|m| m.state).collect();
    assert_eq!(
        states,
        vec![
            MigrationState::Missing,
            MigrationState::Committed,
            MigrationState::Pending,
        ]
    );
}

/// Test that a malformed file aborts before the store is touched
#[tokio::test]
async fn test_load_error_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "001_a.sql", "SELECT 1;");
    write(dir.path(), "README.md", "not a migration");

    let mut engine = engine(dir.path(), MemoryStore::new());
    let err = engine.migrate().await.unwrap_err();

    assert!(err.is_load_error());
    assert!(engine.into_store().executed().is_empty());
}

/// Test that the reconciled view covers every identity exactly once
#[test]
fn test_reconcile_covers_union() {
    // Deterministic sweep over overlapping catalog/ledger windows.
    for catalog_start in 0..4u64 {
        for record_start in 0..4u64 {
            let catalog: Vec<Migration> = (catalog_start..catalog_start + 4)
                .map(|n| Migration {
                    id: id(&format!("{:03}", n)),
                    description: format!("m{}", n),
                    path: format!("migrations/{:03}_m{}.sql", n, n).into(),
                    body: String::new(),
                })
                .collect();
            let records: Vec<_> = (record_start..record_start + 3)
                .map(|n| MigrationRecord::new(id(&format!("{:03}", n)), format!("m{}", n)))
                .collect();

            let status = reconcile(&catalog, &records);

            let lo = catalog_start.min(record_start);
            let hi = (catalog_start + 4).max(record_start + 3);
            let union: Vec<MigrationId> = (lo..hi)
                .filter(|n| {
                    (catalog_start..catalog_start + 4).contains(n)
                        || (record_start..record_start + 3).contains(n)
                })
                .map(|n| id(&format!("{:03}", n)))
                .collect();
            let ids: Vec<MigrationId> = status.migrations().iter().map(|m| m.id).collect();
            assert_eq!(ids, union);

            // Four files against three records always leaves something pending.
            assert!(status.has_pending());
            assert_eq!(
                status.has_missing(),
                record_start < catalog_start || record_start + 3 > catalog_start + 4
            );
        }
    }
}
