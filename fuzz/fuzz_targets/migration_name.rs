//! Fuzz target for migration file name parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_migration_name
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use ratchet_migrate::{MigrationId, MigrationName};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // The parser should never panic, only return errors
    if let Ok(name) = MigrationName::parse(input) {
        // Anything accepted renders back to a name that parses to the same parts.
        let rendered = name.file_name();
        let reparsed = MigrationName::parse(&rendered).expect("rendered name parses");
        assert_eq!(reparsed, name);
    }

    if let Ok(id) = input.parse::<MigrationId>() {
        assert_eq!(id.to_string(), input);
    }
});
