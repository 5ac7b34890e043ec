//! Drift reconciliation between migration files and the ledger.
//!
//! Every identity known to either side ends up in exactly one
//! [`ReconciledMigration`]:
//!
//! ```text
//!   on disk   in ledger   state
//!   -------   ---------   ---------
//!     yes        yes      Committed
//!     yes        no       Pending
//!     no         yes      Missing
//! ```
//!
//! The output is sorted by identity, with ledger-only entries merged into the
//! position their identity implies.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::file::Migration;
use crate::history::MigrationRecord;
use crate::identity::MigrationId;

/// Where a migration stands relative to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationState {
    /// On disk and recorded.
    Committed,
    /// On disk, not recorded.
    Pending,
    /// Recorded, not on disk.
    Missing,
}

impl MigrationState {
    /// One-letter code used in reports.
    pub fn code(&self) -> char {
        match self {
            Self::Committed => 'C',
            Self::Pending => 'P',
            Self::Missing => 'M',
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Committed => write!(f, "committed"),
            Self::Pending => write!(f, "pending"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// Why an uncommitted migration is uncommitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateStatus {
    /// Waiting to be applied.
    Pending,
    /// Recorded but its file is gone.
    Missing,
}

/// A migration joined with its ledger status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledMigration {
    /// Identity.
    pub id: MigrationId,
    /// Description from the file, or from the ledger for missing entries.
    pub description: String,
    /// Ledger status.
    pub state: MigrationState,
    /// File the migration was loaded from; `None` for missing entries.
    pub path: Option<PathBuf>,
    /// When the migration was committed, if it was.
    pub applied_at: Option<DateTime<Utc>>,
    /// Pending, yet older than the newest ledger record.
    pub out_of_order: bool,
}

impl ReconciledMigration {
    /// Whether a ledger record exists for this migration's file.
    pub fn is_committed(&self) -> bool {
        self.state == MigrationState::Committed
    }

    /// Pending or missing; `None` when committed.
    pub fn candidate_status(&self) -> Option<CandidateStatus> {
        match self.state {
            MigrationState::Committed => None,
            MigrationState::Pending => Some(CandidateStatus::Pending),
            MigrationState::Missing => Some(CandidateStatus::Missing),
        }
    }
}

/// Result of reconciling a catalog with the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    migrations: Vec<ReconciledMigration>,
    has_pending: bool,
    has_missing: bool,
}

impl Reconciliation {
    /// Every known migration, sorted by identity.
    pub fn migrations(&self) -> &[ReconciledMigration] {
        &self.migrations
    }

    /// Whether any migration is pending.
    pub fn has_pending(&self) -> bool {
        self.has_pending
    }

    /// Whether any ledger record has no file.
    pub fn has_missing(&self) -> bool {
        self.has_missing
    }

    /// Whether disk and ledger disagree at all.
    pub fn has_drift(&self) -> bool {
        self.has_pending || self.has_missing
    }

    /// Entries in the given state, in identity order.
    pub fn with_state(
        &self,
        state: MigrationState,
    ) -> impl Iterator<Item = &ReconciledMigration> + '_ {
        self.migrations.iter().filter(move |m| m.state == state)
    }

    /// Pending entries, in identity order.
    pub fn pending(&self) -> impl Iterator<Item = &ReconciledMigration> + '_ {
        self.with_state(MigrationState::Pending)
    }

    /// Missing entries, in identity order.
    pub fn missing(&self) -> impl Iterator<Item = &ReconciledMigration> + '_ {
        self.with_state(MigrationState::Missing)
    }

    /// Pending entries that sort before something already recorded.
    pub fn out_of_order(&self) -> impl Iterator<Item = &ReconciledMigration> + '_ {
        self.migrations.iter().filter(|m| m.out_of_order)
    }

    /// Number of entries in the given state.
    pub fn count(&self, state: MigrationState) -> usize {
        self.with_state(state).count()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Whether neither disk nor ledger knows any migration.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// Classify every migration on disk or in the ledger.
///
/// `catalog` may be in any order; the result is ordered by identity.
pub fn reconcile(catalog: &[Migration], records: &[MigrationRecord]) -> Reconciliation {

    let by_id: HashMap<MigrationId, &MigrationRecord> =
        records.iter().map(|r| (r.id, r)).collect();
    let newest_recorded = records.iter().map(|r| r.id).max();

    let mut on_disk: Vec<ReconciledMigration> = catalog
        .iter()
        .map(|m| match by_id.get(&m.id) {
            Some(record) => ReconciledMigration {
                id: m.id,
                description: m.description.clone(),
                state: MigrationState::Committed,
                path: Some(m.path.clone()),
                applied_at: Some(record.applied_at),
                out_of_order: false,
            },
            None => ReconciledMigration {
                id: m.id,
                description: m.description.clone(),
                state: MigrationState::Pending,
                path: Some(m.path.clone()),
                applied_at: None,
                out_of_order: newest_recorded.is_some_and(|newest| m.id < newest),
            },
        })
        .collect();
    on_disk.sort_by_key(|m| m.id);

    let catalog_ids: HashSet<MigrationId> = catalog.iter().map(|m| m.id).collect();
    let mut ledger_only: Vec<ReconciledMigration> = by_id
        .values()
        .filter(|r| !catalog_ids.contains(&r.id))
        .map(|r| ReconciledMigration {
            id: r.id,
            description: r.description.clone(),
            state: MigrationState::Missing,
            path: None,
            applied_at: Some(r.applied_at),
            out_of_order: false,
        })
        .collect();
    ledger_only.sort_by_key(|m| m.id);

    let migrations = merge_by_id(on_disk, ledger_only);
    let has_pending = migrations.iter().any(|m| m.state == MigrationState::Pending);
    let has_missing = migrations.iter().any(|m| m.state == MigrationState::Missing);

    Reconciliation {
        migrations,
        has_pending,
        has_missing,
    }
}

fn merge_by_id(
    left: Vec<ReconciledMigration>,
    right: Vec<ReconciledMigration>,
) -> Vec<ReconciledMigration> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.id < r.id,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }

    merged
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn id(s: &str) -> MigrationId {
        s.parse().unwrap()
    }

    fn migration(name: &str) -> Migration {
        let (prefix, description) = name.split_once('_').unwrap();
        Migration {
            id: id(prefix),
            description: description.to_string(),
            path: PathBuf::from("migrations").join(name),
            body: format!("-- {}", name),
        }
    }

    fn record(name: &str) -> MigrationRecord {
        let (prefix, description) = name.split_once('_').unwrap();
        MigrationRecord::new(id(prefix), description)
    }

    fn summary(reconciliation: &Reconciliation) -> Vec<(String, MigrationState)> {
        reconciliation
            .migrations()
            .iter()
            .map(|m| (m.id.to_string(), m.state))
            .collect()
    }

    #[test]
    fn test_pending_after_committed() {
        let catalog = [migration("001_a"), migration("002_b"), migration("003_c")];
        let records = [record("001_a")];

        let result = reconcile(&catalog, &records);

        assert_eq!(
            summary(&result),
            vec![
                ("001".to_string(), MigrationState::Committed),
                ("002".to_string(), MigrationState::Pending),
                ("003".to_string(), MigrationState::Pending),
            ]
        );
        assert!(result.has_pending());
        assert!(!result.has_missing());
        assert_eq!(result.out_of_order().count(), 0);
    }

    #[test]
    fn test_missing_merged_in_order() {
        let catalog = [migration("002_b")];
        let records = [record("001_a"), record("002_b")];

        let result = reconcile(&catalog, &records);

        assert_eq!(
            summary(&result),
            vec![
                ("001".to_string(), MigrationState::Missing),
                ("002".to_string(), MigrationState::Committed),
            ]
        );
        assert!(result.has_missing());
        assert!(!result.has_pending());

        let missing = &result.migrations()[0];
        assert_eq!(missing.description, "a");
        assert!(missing.path.is_none());
        assert!(!missing.is_committed());
        assert_eq!(missing.candidate_status(), Some(CandidateStatus::Missing));
    }

    #[test]
    fn test_interleaved_missing_and_pending() {
        let catalog = [migration("002_b"), migration("004_d")];
        let records = [record("005_e"), record("001_a"), record("002_b"), record("003_c")];

        let result = reconcile(&catalog, &records);

        assert_eq!(
            summary(&result),
            vec![
                ("001".to_string(), MigrationState::Missing),
                ("002".to_string(), MigrationState::Committed),
                ("003".to_string(), MigrationState::Missing),
                ("004".to_string(), MigrationState::Pending),
                ("005".to_string(), MigrationState::Missing),
            ]
        );
        assert!(result.has_drift());
        assert_eq!(result.count(MigrationState::Missing), 3);
    }

    #[test]
    fn test_unsorted_catalog() {
        let catalog = [migration("003_c"), migration("001_a")];
        let records = [record("002_b")];

        let result = reconcile(&catalog, &records);

        assert_eq!(
            summary(&result),
            vec![
                ("001".to_string(), MigrationState::Pending),
                ("002".to_string(), MigrationState::Missing),
                ("003".to_string(), MigrationState::Pending),
            ]
        );
    }

    #[test]
    fn test_out_of_order_pending() {
        let catalog = [migration("001_a"), migration("002_b"), migration("003_c")];
        let records = [record("001_a"), record("003_c")];

        let result = reconcile(&catalog, &records);

        let late: Vec<String> = result.out_of_order().map(|m| m.id.to_string()).collect();
        assert_eq!(late, vec!["002"]);
    }

    #[test]
    fn test_all_caught_up() {
        let catalog = [migration("001_a"), migration("002_b")];
        let records = [record("001_a"), record("002_b")];

        let result = reconcile(&catalog, &records);

        assert!(!result.has_drift());
        assert_eq!(result.count(MigrationState::Committed), 2);
        assert!(result.migrations().iter().all(|m| m.applied_at.is_some()));
        assert!(result.migrations().iter().all(|m| m.candidate_status().is_none()));
    }

    #[test]
    fn test_empty_inputs() {
        let result = reconcile(&[], &[]);
        assert!(result.is_empty());
        assert!(!result.has_drift());
    }

    #[test]
    fn test_every_identity_once() {
        let catalog: Vec<Migration> = (1..=20)
            .filter(|n| n % 3 != 0)
            .map(|n| migration(&format!("{:03}_m{}", n, n)))
            .collect();
        let records: Vec<MigrationRecord> = (1..=20)
            .filter(|n| n % 2 == 0)
            .map(|n| record(&format!("{:03}_m{}", n, n)))
            .collect();

        let result = reconcile(&catalog, &records);

        let ids: Vec<MigrationId> = result.migrations().iter().map(|m| m.id).collect();
        let mut expected: Vec<MigrationId> = catalog
            .iter()
            .map(|m| m.id)
            .chain(records.iter().map(|r| r.id))
            .collect();
        expected.sort();
        expected.dedup();
        assert_eq!(ids, expected);

        let on_disk: HashSet<MigrationId> = catalog.iter().map(|m| m.id).collect();
        let recorded: HashSet<MigrationId> = records.iter().map(|r| r.id).collect();
        assert_eq!(
            result.has_missing(),
            recorded.iter().any(|id| !on_disk.contains(id))
        );
        assert_eq!(
            result.has_pending(),
            on_disk.iter().any(|id| !recorded.contains(id))
        );
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(MigrationState::Committed.code(), 'C');
        assert_eq!(MigrationState::Pending.code(), 'P');
        assert_eq!(MigrationState::Missing.code(), 'M');
        assert_eq!(MigrationState::Missing.to_string(), "missing");
    }
}
