//! SQL implementation of the device repository

use crate::error::DbError;
use crate::repositories::devices::{
    Device, DevicePreferencesUpdate, DeviceRepository, NewDevice,
};
use crate::repositories::{from_epoch, to_epoch};
use crate::DbClient;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// SQL implementation of the device repository
#[derive(Debug, Clone)]
pub struct SqlDeviceRepository {
    db_client: DbClient,
}

impl SqlDeviceRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

// The `Any` driver cannot decode DateTime<Utc> or bool, so timestamps are
// unix seconds and flags are 0/1 integers, mapped by hand.
fn row_to_device(row: &AnyRow) -> Device {
    let enabled_prayers = row
        .try_get::<Option<String>, _>("enabled_prayers")
        .unwrap_or(None)
        .and_then(|raw| serde_json::from_str(&raw).ok());

    Device {
        id: row.try_get("id").ok(),
        token: row.try_get("token").unwrap_or_default(),
        device_id: row.try_get::<Option<String>, _>("device_id").unwrap_or(None),
        platform: row.try_get::<Option<String>, _>("platform").unwrap_or(None),
        latitude: row.try_get::<Option<f64>, _>("latitude").unwrap_or(None),
        longitude: row.try_get::<Option<f64>, _>("longitude").unwrap_or(None),
        timezone: row.try_get::<Option<String>, _>("timezone").unwrap_or(None),
        enable_prayer_notifications: row
            .try_get::<i64, _>("enable_prayer_notifications")
            .map(|v| v != 0)
            .unwrap_or(true),
        enable_event_notifications: row
            .try_get::<i64, _>("enable_event_notifications")
            .map(|v| v != 0)
            .unwrap_or(true),
        notify_before_prayer: row.try_get("notify_before_prayer").unwrap_or(5),
        enabled_prayers,
        last_active_at: row.try_get::<i64, _>("last_active_at").ok().and_then(from_epoch),
        created_at: row.try_get::<i64, _>("created_at").ok().and_then(from_epoch),
    }
}

fn enabled_prayers_json(device: &Device) -> Result<Option<String>, DbError> {
    device
        .enabled_prayers
        .as_ref()
        .map(|ep| serde_json::to_string(ep))
        .transpose()
        .map_err(DbError::from)
}

impl SqlDeviceRepository {
    /// Write every mutable column of the (already merged) device back.
    async fn store(&self, device: &Device, now: DateTime<Utc>) -> Result<(), DbError> {
        let query = r#"
            UPDATE devices
            SET device_id = $1,
                platform = $2,
                latitude = $3,
                longitude = $4,
                timezone = $5,
                enable_prayer_notifications = $6,
                enable_event_notifications = $7,
                notify_before_prayer = $8,
                enabled_prayers = $9,
                last_active_at = $10
            WHERE token = $11
        "#;

        sqlx::query(query)
            .bind(&device.device_id)
            .bind(&device.platform)
            .bind(device.latitude)
            .bind(device.longitude)
            .bind(&device.timezone)
            .bind(device.enable_prayer_notifications as i64)
            .bind(device.enable_event_notifications as i64)
            .bind(device.notify_before_prayer)
            .bind(enabled_prayers_json(device)?)
            .bind(to_epoch(now))
            .bind(&device.token)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update device: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }
}

impl DeviceRepository for SqlDeviceRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing device registry schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                device_id TEXT,
                platform TEXT,
                latitude REAL,
                longitude REAL,
                timezone TEXT,
                enable_prayer_notifications INTEGER NOT NULL DEFAULT 1,
                enable_event_notifications INTEGER NOT NULL DEFAULT 1,
                notify_before_prayer INTEGER NOT NULL DEFAULT 5,
                enabled_prayers TEXT,
                last_active_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Device registry schema initialized successfully");
        Ok(())
    }

    async fn register(&self, device: NewDevice, now: DateTime<Utc>) -> Result<Device, DbError> {
        debug!("Registering device token: {}", device.token);

        match self.find_by_token(&device.token).await? {
            Some(mut existing) => {
                // Re-registration: refresh the reported metadata, keep
                // stored values for anything the client omitted, never
                // touch the preference flags.
                if device.device_id.is_some() {
                    existing.device_id = device.device_id;
                }
                if device.platform.is_some() {
                    existing.platform = device.platform;
                }
                if device.latitude.is_some() {
                    existing.latitude = device.latitude;
                }
                if device.longitude.is_some() {
                    existing.longitude = device.longitude;
                }
                if device.timezone.is_some() {
                    existing.timezone = device.timezone;
                }
                existing.last_active_at = Some(now);

                self.store(&existing, now).await?;
                info!("Device registration updated: {}", device.token);
                Ok(existing)
            }
            None => {
                let query = r#"
                    INSERT INTO devices
                        (token, device_id, platform, latitude, longitude, timezone,
                         last_active_at, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#;

                sqlx::query(query)
                    .bind(&device.token)
                    .bind(&device.device_id)
                    .bind(&device.platform)
                    .bind(device.latitude)
                    .bind(device.longitude)
                    .bind(&device.timezone)
                    .bind(to_epoch(now))
                    .bind(to_epoch(now))
                    .execute(self.db_client.pool())
                    .await
                    .map_err(|e| {
                        error!("Failed to insert device registration: {}", e);
                        DbError::QueryError(e.to_string())
                    })?;

                info!("Device registration created: {}", device.token);
                self.find_by_token(&device.token)
                    .await?
                    .ok_or_else(|| DbError::NotFound("device vanished after insert".to_string()))
            }
        }
    }

    async fn update_preferences(
        &self,
        token: &str,
        update: DevicePreferencesUpdate,
        now: DateTime<Utc>,
    ) -> Result<Device, DbError> {
        debug!("Updating preferences for device token: {}", token);

        let mut device = self
            .find_by_token(token)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("device not found: {}", token)))?;

        if let Some(v) = update.enable_prayer_notifications {
            device.enable_prayer_notifications = v;
        }
        if let Some(v) = update.enable_event_notifications {
            device.enable_event_notifications = v;
        }
        if let Some(v) = update.notify_before_prayer {
            device.notify_before_prayer = v;
        }
        if update.latitude.is_some() {
            device.latitude = update.latitude;
        }
        if update.longitude.is_some() {
            device.longitude = update.longitude;
        }
        if update.timezone.is_some() {
            device.timezone = update.timezone;
        }
        if update.enabled_prayers.is_some() {
            device.enabled_prayers = update.enabled_prayers;
        }
        device.last_active_at = Some(now);

        self.store(&device, now).await?;
        info!("Device preferences updated: {}", token);
        Ok(device)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Device>, DbError> {
        let query = r#"
            SELECT id, token, device_id, platform, latitude, longitude, timezone,
                   enable_prayer_notifications, enable_event_notifications,
                   notify_before_prayer, enabled_prayers, last_active_at, created_at
            FROM devices
            WHERE token = $1
        "#;

        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find device: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(row.as_ref().map(row_to_device))
    }

    async fn find_eligible(&self) -> Result<Vec<Device>, DbError> {
        debug!("Finding devices eligible for prayer notifications");

        let query = r#"
            SELECT id, token, device_id, platform, latitude, longitude, timezone,
                   enable_prayer_notifications, enable_event_notifications,
                   notify_before_prayer, enabled_prayers, last_active_at, created_at
            FROM devices
            WHERE enable_prayer_notifications = 1
              AND latitude IS NOT NULL
              AND longitude IS NOT NULL
        "#;

        let rows = sqlx::query(query)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to query eligible devices: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(rows.iter().map(row_to_device).collect())
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, DbError> {
        debug!("Deleting device registration for token: {}", token);

        let result = sqlx::query("DELETE FROM devices WHERE token = $1")
            .bind(token)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete device registration: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_inactive_since(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        debug!("Deleting devices inactive since {}", cutoff);

        let result = sqlx::query("DELETE FROM devices WHERE last_active_at < $1")
            .bind(to_epoch(cutoff))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete inactive devices: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }
}
