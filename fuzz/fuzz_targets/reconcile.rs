//! Fuzz target for reconciliation.
//!
//! Builds an arbitrary catalog and ledger and checks the classification
//! invariants hold.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_reconcile
//! ```

#![no_main]

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ratchet_migrate::{Migration, MigrationId, MigrationRecord, MigrationState, reconcile};

#[derive(Debug, Arbitrary)]
struct Input {
    catalog: BTreeSet<u16>,
    records: BTreeSet<u16>,
}

fn id(n: u16) -> MigrationId {
    format!("{:05}", n).parse().expect("digits parse")
}

fuzz_target!(|input: Input| {
    let catalog: Vec<Migration> = input
        .catalog
        .iter()
        .map(|&n| Migration {
            id: id(n),
            description: format!("m{}", n),
            path: format!("migrations/{:05}_m{}.sql", n, n).into(),
            body: String::new(),
        })
        .collect();
    let records: Vec<MigrationRecord> = input
        .records
        .iter()
        .map(|&n| MigrationRecord::new(id(n), format!("m{}", n)))
        .collect();

    let status = reconcile(&catalog, &records);

    let union: Vec<MigrationId> = input.catalog.union(&input.records).map(|&n| id(n)).collect();
    let ids: Vec<MigrationId> = status.migrations().iter().map(|m| m.id).collect();
    assert_eq!(ids, union);

    assert_eq!(
        status.has_missing(),
        input.records.difference(&input.catalog).next().is_some()
    );
    assert_eq!(
        status.has_pending(),
        input.catalog.difference(&input.records).next().is_some()
    );

    for entry in status.migrations() {
        let on_disk = input.catalog.contains(&(entry.id.value() as u16));
        let recorded = input.records.contains(&(entry.id.value() as u16));
        let expected = match (on_disk, recorded) {
            (true, true) => MigrationState::Committed,
            (true, false) => MigrationState::Pending,
            _ => MigrationState::Missing,
        };
        assert_eq!(entry.state, expected);
    }
});
