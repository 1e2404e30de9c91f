// --- File: crates/deenify_prayer/src/logic.rs ---
//! Pure reminder planning: from a day's prayer times to the notification
//! instants that are still ahead of "now".
//!
//! Everything here is deterministic in its inputs so the scheduling rules
//! can be tested without a store or a clock.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Asia::Jakarta;
use deenify_common::models::{EnabledPrayers, PrayerTimesSnapshot};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum PrayerError {
    #[error("Failed to parse prayer time: {0}")]
    TimeParseError(String),
    #[error("Prayer times source error: {0}")]
    SourceError(String),
    #[error("Database error: {0}")]
    DbError(#[from] deenify_db::DbError),
    #[error("Device has no coordinates: {0}")]
    MissingCoordinates(String),
}

/// The five daily prayers, in their fixed daily order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }

    /// Key used in the per-prayer enable map.
    pub fn key(&self) -> &'static str {
        match self {
            Prayer::Fajr => "fajr",
            Prayer::Dhuhr => "dhuhr",
            Prayer::Asr => "asr",
            Prayer::Maghrib => "maghrib",
            Prayer::Isha => "isha",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Prayer::Fajr => "🌅",
            Prayer::Dhuhr => "☀️",
            Prayer::Asr => "🌤️",
            Prayer::Maghrib => "🌆",
            Prayer::Isha => "🌙",
        }
    }

    fn clock_time<'a>(&self, timings: &'a PrayerTimesSnapshot) -> &'a str {
        match self {
            Prayer::Fajr => &timings.fajr,
            Prayer::Dhuhr => &timings.dhuhr,
            Prayer::Asr => &timings.asr,
            Prayer::Maghrib => &timings.maghrib,
            Prayer::Isha => &timings.isha,
        }
    }
}

/// A reminder the scheduler should insert: one prayer, one instant.
#[derive(Debug, Clone)]
pub struct PlannedReminder {
    pub prayer: Prayer,
    /// The prayer's clock time as shown to the user ("HH:MM")
    pub prayer_time: String,
    /// The notification instant: prayer time minus the lead
    pub due_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub meta: serde_json::Value,
}

/// Parse an "HH:MM" clock time.
///
/// Tolerates a trailing annotation ("04:37 (WIB)") by taking the first
/// whitespace-separated token.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, PrayerError> {
    let trimmed = raw.trim();
    let head = trimmed.split_whitespace().next().unwrap_or(trimmed);

    NaiveTime::parse_from_str(head, "%H:%M")
        .map_err(|_| PrayerError::TimeParseError(raw.to_string()))
}

/// Compute the reminders still worth scheduling for one device.
///
/// For each enabled prayer (a missing entry in the enable map means
/// enabled), the candidate instant is the prayer's local time on the
/// snapshot's date minus `lead_minutes`. Only candidates strictly in the
/// future relative to `now` are returned; a prayer whose window has
/// passed is skipped for the day, with no roll-forward to tomorrow.
///
/// A malformed clock time aborts that prayer only; the rest of the day is
/// still planned.
///
/// The app serves a single-timezone audience, so the local zone is fixed
/// the same way the date-keyed prayer cache is.
pub fn plan_reminders(
    timings: &PrayerTimesSnapshot,
    lead_minutes: i64,
    enabled: Option<&EnabledPrayers>,
    now: DateTime<Utc>,
) -> Vec<PlannedReminder> {
    let mut planned = Vec::new();

    for prayer in Prayer::ALL {
        if let Some(map) = enabled {
            if !map.allows(prayer.key()) {
                debug!("Skipping {} - disabled by user", prayer.name());
                continue;
            }
        }

        let raw = prayer.clock_time(timings);
        let clock_time = match parse_clock_time(raw) {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping {}: {}", prayer.name(), e);
                continue;
            }
        };

        let local = match Jakarta
            .from_local_datetime(&timings.date.and_time(clock_time))
            .single()
        {
            Some(dt) => dt,
            None => {
                warn!(
                    "Skipping {}: ambiguous local time {} on {}",
                    prayer.name(),
                    raw,
                    timings.date
                );
                continue;
            }
        };

        let due_at = local.with_timezone(&Utc) - Duration::minutes(lead_minutes);

        if due_at <= now {
            debug!("Skipping {} because its window has passed", prayer.name());
            continue;
        }

        let display_time = raw.trim().split_whitespace().next().unwrap_or(raw);
        planned.push(PlannedReminder {
            prayer,
            prayer_time: display_time.to_string(),
            due_at,
            title: format!("{} Waktu {}", prayer.emoji(), prayer.name()),
            body: format!(
                "{} menit lagi masuk waktu {} ({})",
                lead_minutes,
                prayer.name(),
                display_time
            ),
            meta: json!({
                "prayerName": prayer.name(),
                "prayerTime": display_time,
                "notifyBeforeMinutes": lead_minutes,
            }),
        });
    }

    planned
}
