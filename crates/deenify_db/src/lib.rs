//! Database integration for Deenify
//!
//! This crate provides a database client built on SQLx's `Any` driver
//! (SQLite by default, PostgreSQL behind a feature flag) together with the
//! repository traits and SQL implementations for the application's two
//! logical store regions: the device registry and the notification
//! schedule, plus the read-through caches (prayer times, locations, Quran
//! text) and the Islamic events table.
//!
//! Timestamps that the application must compare or filter on (due times,
//! activity cutoffs) are stored as unix seconds: the `Any` driver cannot
//! decode `DateTime<Utc>` columns, and lexically-ordered text timestamps
//! are too easy to get wrong across backends.

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;

pub use repositories::devices::{DevicePreferencesUpdate, DeviceRepository, NewDevice};
pub use repositories::devices_sql::SqlDeviceRepository;
pub use repositories::events::{
    IslamicEvent, IslamicEventRepository, NewIslamicEvent, SqlIslamicEventRepository,
    UpdateIslamicEvent,
};
pub use repositories::location_cache::{
    CachedLocation, LocationCacheRepository, SqlLocationCacheRepository,
};
pub use repositories::prayer_cache::{PrayerCacheRepository, SqlPrayerCacheRepository};
pub use repositories::quran::{
    Ayah, AyahWithSurah, QuranRepository, SqlQuranRepository, Surah, SurahWithAyahs,
};
pub use repositories::schedules::{
    DueReminder, NewScheduledNotification, NotificationScheduleRepository,
};
pub use repositories::schedules_sql::SqlNotificationScheduleRepository;
