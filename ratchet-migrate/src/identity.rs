//! Migration identities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{MigrateResult, MigrationError};

/// Number of digits in identities generated from the clock (`YYYYMMDDHHMMSS`).
pub const TIMESTAMP_WIDTH: usize = 14;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

// u64 holds every 19-digit decimal.
const MAX_WIDTH: usize = 19;

/// Sortable identity taken from the digit prefix of a migration file name.
///
/// The prefix is kept as its numeric value together with the number of digits
/// it was written with, so both `001` and `20240101120000` display exactly as
/// they appear on disk. Ordering is numeric first, which matches lexicographic
/// ordering for zero-padded prefixes of the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MigrationId {
    value: u64,
    width: u8,
}

impl MigrationId {
    /// Identity for the given instant, in `YYYYMMDDHHMMSS` form.
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        let digits = at.format(TIMESTAMP_FORMAT).to_string();
        // Years past 9999 are not representable; clamp rather than fail.
        let value = digits.parse().unwrap_or(99_991_231_235_959);
        Self {
            value,
            width: TIMESTAMP_WIDTH as u8,
        }
    }

    /// Identity for the current wall-clock time.
    pub fn now() -> Self {
        Self::from_timestamp(Utc::now())
    }

    /// Numeric value of the prefix.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Number of digits the prefix is written with.
    pub fn width(&self) -> usize {
        self.width as usize
    }

    /// Interpret the identity as a `YYYYMMDDHHMMSS` timestamp, if it is one.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        if self.width() != TIMESTAMP_WIDTH {
            return None;
        }
        NaiveDateTime::parse_from_str(&self.to_string(), TIMESTAMP_FORMAT).ok()
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.value, width = self.width())
    }
}

impl FromStr for MigrationId {
    type Err = MigrationError;

    fn from_str(s: &str) -> MigrateResult<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MigrationError::invalid_name(format!(
                "identity must be a non-empty run of digits: '{}'",
                s
            )));
        }

        if s.len() > MAX_WIDTH {
            return Err(MigrationError::invalid_name(format!(
                "identity '{}' is longer than {} digits",
                s, MAX_WIDTH
            )));
        }

        let value = s
            .parse::<u64>()
            .map_err(|e| MigrationError::invalid_name(format!("identity '{}': {}", s, e)))?;

        Ok(Self {
            value,
            width: s.len() as u8,
        })
    }
}
