// --- File: crates/deenify_prayer/src/scheduler.rs ---
//! The prayer notification scheduler.
//!
//! Two halves, joined only through the durable schedule store:
//! computation inserts per-device reminder records for the rest of the
//! day, and the sweep dispatches whatever has come due. Both are driven
//! by periodic triggers in the backend binary; neither holds state
//! between runs.
//!
//! Delivery is at-least-once: the sweep dispatches first and claims the
//! record second, so a crash between the two re-sends on the next sweep.
//! The claim itself is an atomic conditional update, which is what keeps
//! two overlapping sweeps from both counting (or re-marking) the same
//! record.

use crate::logic::{plan_reminders, PrayerError};
use crate::provider::CachedPrayerTimes;
use chrono::{DateTime, Duration, Utc};
use deenify_common::models::{Device, NotificationKind};
use deenify_common::services::{BoxedError, NotificationGateway};
use deenify_db::{
    DeviceRepository, NewScheduledNotification, NotificationScheduleRepository,
    PrayerCacheRepository, SqlDeviceRepository, SqlNotificationScheduleRepository,
    SqlPrayerCacheRepository,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Sent prayer reminders are kept this long for inspection, then purged.
const REMINDER_RETENTION_DAYS: i64 = 7;

/// Outcome of the per-device computation inside a bulk run.
#[derive(Debug, Clone)]
pub struct DeviceScheduleOutcome {
    pub device_id: Option<i64>,
    pub token: String,
    pub scheduled: u32,
    pub error: Option<String>,
}

/// Structured result of a bulk compute: one entry per eligible device, so
/// callers can see individual failures instead of digging through logs.
#[derive(Debug, Clone, Default)]
pub struct BulkScheduleOutcome {
    pub results: Vec<DeviceScheduleOutcome>,
}

impl BulkScheduleOutcome {
    pub fn total_scheduled(&self) -> u32 {
        self.results.iter().map(|r| r.scheduled).sum()
    }

    pub fn failed_devices(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }
}

/// The scheduler, generic over its store seams so tests can swap in
/// in-memory fakes. All collaborators are injected; nothing here is a
/// process-wide singleton.
pub struct PrayerNotificationScheduler<D, S, C> {
    devices: Arc<D>,
    schedules: Arc<S>,
    prayer_times: Arc<CachedPrayerTimes<C>>,
    gateway: Arc<dyn NotificationGateway<Error = BoxedError>>,
}

/// The production instantiation over the SQL repositories.
pub type SqlPrayerNotificationScheduler = PrayerNotificationScheduler<
    SqlDeviceRepository,
    SqlNotificationScheduleRepository,
    SqlPrayerCacheRepository,
>;

impl<D, S, C> PrayerNotificationScheduler<D, S, C>
where
    D: DeviceRepository,
    S: NotificationScheduleRepository,
    C: PrayerCacheRepository,
{
    pub fn new(
        devices: Arc<D>,
        schedules: Arc<S>,
        prayer_times: Arc<CachedPrayerTimes<C>>,
        gateway: Arc<dyn NotificationGateway<Error = BoxedError>>,
    ) -> Self {
        Self {
            devices,
            schedules,
            prayer_times,
            gateway,
        }
    }

    /// Compute and insert today's remaining reminders for one device.
    ///
    /// The device's pending (unsent) reminders are cleared first, so a
    /// recompute after a preference change replaces the old plan instead
    /// of stacking duplicates next to it. Sent rows are never touched.
    ///
    /// Inserts are per-prayer independent: one failed insert is logged
    /// and the remaining prayers still get their rows.
    ///
    /// Returns the number of reminders scheduled.
    pub async fn schedule_for_device(
        &self,
        device: &Device,
        now: DateTime<Utc>,
    ) -> Result<u32, PrayerError> {
        let (latitude, longitude) = match (device.latitude, device.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(PrayerError::MissingCoordinates(device.token.clone())),
        };

        if let Some(device_id) = device.id {
            let cleared = self
                .schedules
                .delete_pending_reminders_for_device(device_id)
                .await?;
            if cleared > 0 {
                debug!(
                    "Cleared {} pending reminders for device {} before recompute",
                    cleared, device_id
                );
            }
        }

        let timings = self.prayer_times.get_today(latitude, longitude, now).await?;

        let lead_minutes = device.notify_before_prayer.max(0);
        let planned = plan_reminders(
            &timings,
            lead_minutes,
            device.enabled_prayers.as_ref(),
            now,
        );

        let mut scheduled = 0u32;
        for reminder in planned {
            let created = self
                .schedules
                .create(
                    NewScheduledNotification {
                        kind: NotificationKind::Azan,
                        title: reminder.title,
                        body: reminder.body,
                        meta: Some(reminder.meta),
                        due_at: reminder.due_at,
                        device_id: device.id,
                    },
                    now,
                )
                .await;

            match created {
                Ok(_) => {
                    debug!(
                        "Scheduled {} for {}",
                        reminder.prayer.name(),
                        reminder.due_at
                    );
                    scheduled += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to insert {} reminder for device {:?}: {}",
                        reminder.prayer.name(),
                        device.id,
                        e
                    );
                }
            }
        }

        info!(
            "Scheduled {} prayer notifications for device {:?}",
            scheduled, device.id
        );
        Ok(scheduled)
    }

    /// Compute today's reminders for every eligible device.
    ///
    /// A failure for one device never aborts the rest; it shows up in the
    /// returned outcome with a zero contribution.
    pub async fn schedule_daily(&self, now: DateTime<Utc>) -> Result<BulkScheduleOutcome, PrayerError> {
        info!("Scheduling daily prayer notifications");

        let devices = self.devices.find_eligible().await?;
        info!(
            "Found {} devices with prayer notifications enabled",
            devices.len()
        );

        let mut outcome = BulkScheduleOutcome::default();
        for device in &devices {
            match self.schedule_for_device(device, now).await {
                Ok(scheduled) => outcome.results.push(DeviceScheduleOutcome {
                    device_id: device.id,
                    token: device.token.clone(),
                    scheduled,
                    error: None,
                }),
                Err(e) => {
                    error!(
                        "Failed to schedule notifications for device {:?}: {}",
                        device.id, e
                    );
                    outcome.results.push(DeviceScheduleOutcome {
                        device_id: device.id,
                        token: device.token.clone(),
                        scheduled: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(
            "Scheduled {} prayer notifications for {} devices ({} failed)",
            outcome.total_scheduled(),
            devices.len(),
            outcome.failed_devices()
        );
        Ok(outcome)
    }

    /// Dispatch every due, undelivered prayer reminder.
    ///
    /// Records without a resolvable device token are skipped. A gateway
    /// failure leaves its record due for the next sweep and never aborts
    /// the batch. Returns the number successfully dispatched and claimed.
    pub async fn process_due_reminders(&self, now: DateTime<Utc>) -> Result<u32, PrayerError> {
        let due = self.schedules.due_prayer_reminders(now).await?;

        if due.is_empty() {
            return Ok(0);
        }

        info!("Processing {} pending prayer notifications", due.len());

        let mut sent = 0u32;
        for reminder in due {
            let notification = reminder.notification;

            let Some(id) = notification.id else {
                continue;
            };
            let Some(token) = reminder.device_token else {
                warn!("Prayer reminder {} has no device token, skipping", id);
                continue;
            };

            let dispatched = self
                .gateway
                .send_to_device(
                    &token,
                    &notification.title,
                    &notification.body,
                    notification.meta.as_ref(),
                )
                .await;

            match dispatched {
                Ok(_) => match self.schedules.mark_sent(id, now).await {
                    Ok(true) => sent += 1,
                    Ok(false) => {
                        warn!("Reminder {} was already claimed by another sweep", id);
                    }
                    Err(e) => {
                        // The record stays due and is re-sent next sweep.
                        error!("Failed to mark reminder {} as sent: {}", id, e);
                    }
                },
                Err(e) => {
                    error!("Failed to send notification {}: {}", id, e);
                }
            }
        }

        info!("Sent {} prayer notifications", sent);
        Ok(sent)
    }

    /// Purge delivered reminders past the retention window.
    pub async fn clean_old_reminders(&self, now: DateTime<Utc>) -> Result<u64, PrayerError> {
        let removed = self
            .schedules
            .delete_sent_before(now - Duration::days(REMINDER_RETENTION_DAYS))
            .await?;
        info!("Cleaned {} old notifications", removed);
        Ok(removed)
    }
}
