// --- File: crates/deenify_common/src/models.rs ---

// Domain models shared by more than one crate: device registrations,
// scheduled notifications and prayer time snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered mobile device, identified by its push token.
///
/// The token is the sole identity key: registering the same token twice
/// updates the existing row. A device without coordinates cannot receive
/// prayer notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Device {
    /// The unique identifier for this registration
    pub id: Option<i64>,

    /// The FCM push token (unique, stable per installed app instance)
    pub token: String,

    /// Optional client-side device identifier
    pub device_id: Option<String>,

    /// Platform tag, e.g. "android" or "ios"
    pub platform: Option<String>,

    /// Last known latitude
    pub latitude: Option<f64>,

    /// Last known longitude
    pub longitude: Option<f64>,

    /// IANA timezone label reported by the client
    pub timezone: Option<String>,

    /// Whether the device wants prayer reminders
    pub enable_prayer_notifications: bool,

    /// Whether the device wants event broadcasts
    pub enable_event_notifications: bool,

    /// Lead time in minutes before each prayer
    pub notify_before_prayer: i64,

    /// Per-prayer enable map; None means every prayer is enabled
    pub enabled_prayers: Option<EnabledPrayers>,

    /// The timestamp of the last registration or preference update
    pub last_active_at: Option<DateTime<Utc>>,

    /// The timestamp when this registration was created
    pub created_at: Option<DateTime<Utc>>,
}

impl Device {
    /// Both coordinates present. Eligibility for prayer scheduling
    /// requires this in addition to the enable flag.
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Per-prayer enable flags. A missing entry means "enabled".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnabledPrayers {
    pub fajr: Option<bool>,
    pub dhuhr: Option<bool>,
    pub asr: Option<bool>,
    pub maghrib: Option<bool>,
    pub isha: Option<bool>,
}

impl EnabledPrayers {
    /// Returns false only when the given prayer key is explicitly disabled.
    pub fn allows(&self, prayer_key: &str) -> bool {
        let flag = match prayer_key {
            "fajr" => self.fajr,
            "dhuhr" => self.dhuhr,
            "asr" => self.asr,
            "maghrib" => self.maghrib,
            "isha" => self.isha,
            _ => None,
        };
        flag != Some(false)
    }
}

/// The kind of a scheduled notification.
///
/// `Azan` rows are per-device prayer reminders; the other kinds are
/// broadcast notifications fanned out to the topic of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum NotificationKind {
    Azan,
    Event,
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Azan => "AZAN",
            NotificationKind::Event => "EVENT",
            NotificationKind::General => "GENERAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AZAN" => Some(NotificationKind::Azan),
            "EVENT" => Some(NotificationKind::Event),
            "GENERAL" => Some(NotificationKind::General),
            _ => None,
        }
    }

    /// The FCM topic broadcast notifications of this kind are sent to.
    pub fn topic(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A durable notification record waiting to be delivered.
///
/// `due_at` is set once at creation and never mutated; `sent` transitions
/// false -> true exactly once and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScheduledNotification {
    pub id: Option<i64>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Free-form metadata; values are stringified before delivery
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub meta: Option<serde_json::Value>,
    pub due_at: DateTime<Utc>,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    /// Owning device for prayer reminders; None for broadcasts
    pub device_id: Option<i64>,
}

/// The five prayer clock-times for one calendar date.
///
/// At most one snapshot exists per date; the cache is keyed by date
/// alone, not by location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PrayerTimesSnapshot {
    pub date: NaiveDate,
    pub fajr: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}
