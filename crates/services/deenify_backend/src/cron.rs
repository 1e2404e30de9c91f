// --- File: crates/services/deenify_backend/src/cron.rs ---
//! Periodic tasks: the minute-granularity due sweeps, the daily bulk
//! compute, and the retention purges.
//!
//! Each task is an independent tokio loop against the shared store; there
//! is no ordering dependency between them beyond "the daily compute
//! populates what the sweeps later consume". The shutdown channel lets an
//! in-flight sweep finish its current batch before the loop stops.

use crate::app_state::AppState;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Asia::Jakarta;
use deenify_db::DeviceRepository;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Devices silent for this long are dropped by the weekly purge.
const DEVICE_INACTIVITY_DAYS: i64 = 30;

/// Time until the next local occurrence of `hour:minute` (optionally on a
/// specific weekday).
fn duration_until_next(hour: u32, minute: u32, weekday: Option<Weekday>) -> Duration {
    let now = Utc::now().with_timezone(&Jakarta);
    let mut candidate: NaiveDateTime = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .expect("valid wall clock time");

    loop {
        let day_matches = weekday
            .map(|w| candidate.date().weekday() == w)
            .unwrap_or(true);
        if day_matches {
            if let Some(local) = Jakarta.from_local_datetime(&candidate).single() {
                if local > now {
                    return (local - now).to_std().unwrap_or(Duration::from_secs(60));
                }
            }
        }
        candidate += ChronoDuration::days(1);
    }
}

/// Run `task` every `period` until shutdown.
fn spawn_every<F, Fut>(mut shutdown: watch::Receiver<bool>, period: Duration, task: F)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => task().await,
                _ = shutdown.changed() => break,
            }
        }
    });
}

/// Run `task` at the next local `hour:minute` (optionally only on
/// `weekday`), then keep rescheduling until shutdown.
fn spawn_at<F, Fut>(
    mut shutdown: watch::Receiver<bool>,
    hour: u32,
    minute: u32,
    weekday: Option<Weekday>,
    name: &'static str,
    task: F,
) where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let wait = duration_until_next(hour, minute, weekday);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    info!("Running scheduled task: {}", name);
                    task().await;
                }
                _ = shutdown.changed() => break,
            }
        }
    });
}

/// Spawn every periodic task. Cadences live here, in the deployment
/// layer; the services only expose the operations.
pub fn spawn_periodic_tasks(state: Arc<AppState>, shutdown: watch::Receiver<bool>) {
    let push_enabled = state.config.use_firebase;
    let prayer_enabled = state.config.use_prayer;

    // Process due prayer reminders every minute
    if push_enabled && prayer_enabled {
        let state = state.clone();
        spawn_every(shutdown.clone(), SWEEP_INTERVAL, move || {
            let state = state.clone();
            async move {
                match state.scheduler.process_due_reminders(Utc::now()).await {
                    Ok(sent) if sent > 0 => info!("Sent {} prayer notifications", sent),
                    Ok(_) => {}
                    Err(e) => error!("Failed to process prayer notifications: {}", e),
                }
            }
        });
    }

    // Process due broadcast notifications every minute
    if push_enabled {
        let state = state.clone();
        spawn_every(shutdown.clone(), SWEEP_INTERVAL, move || {
            let state = state.clone();
            async move {
                match state.notifications.process_due_broadcasts(Utc::now()).await {
                    Ok(sent) if sent > 0 => info!("Processed {} pending notifications", sent),
                    Ok(_) => {}
                    Err(e) => error!("Failed to process notifications: {}", e),
                }
            }
        });
    }

    // Schedule the day's prayer notifications at 01:00
    if push_enabled && prayer_enabled {
        let state = state.clone();
        spawn_at(
            shutdown.clone(),
            1,
            0,
            None,
            "daily prayer scheduling",
            move || {
                let state = state.clone();
                async move {
                    match state.scheduler.schedule_daily(Utc::now()).await {
                        Ok(outcome) => info!(
                            "Scheduled {} prayer notifications ({} devices failed)",
                            outcome.total_scheduled(),
                            outcome.failed_devices()
                        ),
                        Err(e) => error!("Failed to schedule prayer notifications: {}", e),
                    }
                }
            },
        );
    }

    // Purge stale caches shortly after midnight
    {
        let state = state.clone();
        spawn_at(shutdown.clone(), 0, 0, None, "cache cleanup", move || {
            let state = state.clone();
            async move {
                if let Err(e) = state.prayer_times.clean_old_cache(Utc::now()).await {
                    error!("Prayer cache cleanup failed: {}", e);
                }
                if let Some(location) = &state.location {
                    if let Err(e) = location.clean_old_cache(Utc::now()).await {
                        error!("Location cache cleanup failed: {}", e);
                    }
                }
            }
        });
    }

    // Purge delivered notifications past retention at 03:00
    {
        let state = state.clone();
        spawn_at(
            shutdown.clone(),
            3,
            0,
            None,
            "old notification cleanup",
            move || {
                let state = state.clone();
                async move {
                    if let Err(e) = state.scheduler.clean_old_reminders(Utc::now()).await {
                        error!("Notification cleanup failed: {}", e);
                    }
                }
            },
        );
    }

    // Drop inactive devices every Sunday at 02:00
    {
        let state = state.clone();
        spawn_at(
            shutdown,
            2,
            0,
            Some(Weekday::Sun),
            "inactive device cleanup",
            move || {
                let state = state.clone();
                async move {
                    let cutoff = Utc::now() - ChronoDuration::days(DEVICE_INACTIVITY_DAYS);
                    match state.devices.delete_inactive_since(cutoff).await {
                        Ok(cleaned) => info!("Cleaned {} inactive devices", cleaned),
                        Err(e) => error!("Failed to clean inactive devices: {}", e),
                    }
                }
            },
        );
    }

    info!("Periodic tasks scheduled");
}
