//! Repository for the device registry
//!
//! The device registry maps a push token to its registration metadata and
//! notification preferences. The token is the sole identity key:
//! registering a token that already exists updates the row in place.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use serde::Deserialize;

// Re-export the shared model for convenience
pub use deenify_common::models::{Device, EnabledPrayers};

/// Registration payload: identity plus the metadata a client reports.
/// Fields left as None keep their stored value on re-registration.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub token: String,
    pub device_id: Option<String>,
    pub platform: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

/// Partial preference update; None fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DevicePreferencesUpdate {
    pub enable_prayer_notifications: Option<bool>,
    pub enable_event_notifications: Option<bool>,
    pub notify_before_prayer: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub enabled_prayers: Option<EnabledPrayers>,
}

/// Repository for device registrations
pub trait DeviceRepository: Send + Sync {
    /// Create the devices table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Register a device, upserting by token. The device's last-active
    /// timestamp is set to `now` either way.
    fn register(
        &self,
        device: NewDevice,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Device, DbError>> + Send;

    /// Apply a partial preference update to the device with the given
    /// token.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] when no device has that token.
    fn update_preferences(
        &self,
        token: &str,
        update: DevicePreferencesUpdate,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Device, DbError>> + Send;

    /// Find a device by its push token.
    fn find_by_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<Device>, DbError>> + Send;

    /// Every device eligible for prayer notifications: prayer
    /// notifications enabled and both coordinates present.
    fn find_eligible(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Device>, DbError>> + Send;

    /// Delete a registration (unregister).
    ///
    /// Returns `true` if a row was deleted.
    fn delete_by_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Delete every device whose last activity is before `cutoff`.
    ///
    /// Returns the number of rows deleted.
    fn delete_inactive_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, DbError>> + Send;
}
