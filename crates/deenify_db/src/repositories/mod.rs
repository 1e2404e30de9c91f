//! Repository modules for database access
//!
//! Each entity gets a trait describing its operations and a SQL
//! implementation over the shared [`DbClient`](crate::DbClient). The
//! traits are what the services depend on, which keeps the scheduling
//! logic testable with in-memory fakes.

pub mod devices;
pub mod devices_sql;
pub mod events;
pub mod location_cache;
pub mod prayer_cache;
pub mod quran;
pub mod schedules;
pub mod schedules_sql;

use chrono::{DateTime, Utc};

/// Convert a timestamp to the unix-seconds representation used in storage.
pub(crate) fn to_epoch(ts: DateTime<Utc>) -> i64 {
    ts.timestamp()
}

/// Convert stored unix seconds back to a timestamp.
///
/// Returns None for values outside chrono's representable range, which in
/// practice means a corrupted row.
pub(crate) fn from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
