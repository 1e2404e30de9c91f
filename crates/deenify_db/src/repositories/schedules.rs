//! Repository for the notification schedule store
//!
//! The schedule store is a durable queue of pending and sent notification
//! records. Prayer reminders (kind AZAN) reference their owning device and
//! keep a delivered flag; broadcast records reference no device and are
//! deleted once sent.

use crate::error::DbError;
use chrono::{DateTime, Utc};

// Re-export the shared models for convenience
pub use deenify_common::models::{NotificationKind, ScheduledNotification};

/// Creation payload for a schedule record. `due_at` is immutable after
/// insertion.
#[derive(Debug, Clone)]
pub struct NewScheduledNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub meta: Option<serde_json::Value>,
    pub due_at: DateTime<Utc>,
    pub device_id: Option<i64>,
}

/// A due prayer reminder joined with the owning device's push token.
///
/// The token is optional: the device may have been unregistered between
/// scheduling and delivery.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub notification: ScheduledNotification,
    pub device_token: Option<String>,
}

/// Repository for scheduled notifications
pub trait NotificationScheduleRepository: Send + Sync {
    /// Create the notification_schedules table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert a new schedule record and return it with its id set.
    fn create(
        &self,
        notification: NewScheduledNotification,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<ScheduledNotification, DbError>> + Send;

    /// Every undelivered prayer reminder with due_at <= now, joined with
    /// the owning device's token.
    fn due_prayer_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<DueReminder>, DbError>> + Send;

    /// Every unsent broadcast record (kind != AZAN) with due_at <= now.
    fn due_broadcasts(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<ScheduledNotification>, DbError>> + Send;

    /// Atomically claim a record as delivered.
    ///
    /// This is a single conditional UPDATE (`... AND sent = 0`), not a
    /// read-then-write: two concurrent sweeps racing over the same record
    /// can each dispatch it, but only one claims it, and a claimed record
    /// is never swept again. Returns `true` if this call claimed the row.
    fn mark_sent(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Delete a record by id. Returns `true` if a row was deleted.
    fn delete(&self, id: i64)
        -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Delete every undelivered prayer reminder owned by the device.
    /// Used to clear the slate before a recompute; delivered rows are
    /// never touched.
    fn delete_pending_reminders_for_device(
        &self,
        device_id: i64,
    ) -> impl std::future::Future<Output = Result<u64, DbError>> + Send;

    /// Delete delivered records with sent_at before `cutoff` (retention
    /// sweep).
    fn delete_sent_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, DbError>> + Send;

    /// Undelivered records with due_at >= now, soonest first.
    fn list_upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<ScheduledNotification>, DbError>> + Send;
}
