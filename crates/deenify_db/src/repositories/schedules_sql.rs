//! SQL implementation of the notification schedule repository

use crate::error::DbError;
use crate::repositories::schedules::{
    DueReminder, NewScheduledNotification, NotificationKind, NotificationScheduleRepository,
    ScheduledNotification,
};
use crate::repositories::{from_epoch, to_epoch};
use crate::DbClient;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info, warn};

/// SQL implementation of the notification schedule repository
#[derive(Debug, Clone)]
pub struct SqlNotificationScheduleRepository {
    db_client: DbClient,
}

impl SqlNotificationScheduleRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn row_to_notification(row: &AnyRow) -> ScheduledNotification {
    let kind_raw: String = row.try_get("kind").unwrap_or_default();
    let kind = NotificationKind::parse(&kind_raw).unwrap_or_else(|| {
        warn!("Unknown notification kind in store: {}", kind_raw);
        NotificationKind::General
    });

    let meta = row
        .try_get::<Option<String>, _>("meta")
        .unwrap_or(None)
        .and_then(|raw| serde_json::from_str(&raw).ok());

    ScheduledNotification {
        id: row.try_get("id").ok(),
        kind,
        title: row.try_get("title").unwrap_or_default(),
        body: row.try_get("body").unwrap_or_default(),
        meta,
        due_at: row
            .try_get::<i64, _>("due_at")
            .ok()
            .and_then(from_epoch)
            .unwrap_or_else(Utc::now),
        sent: row.try_get::<i64, _>("sent").map(|v| v != 0).unwrap_or(false),
        sent_at: row
            .try_get::<Option<i64>, _>("sent_at")
            .unwrap_or(None)
            .and_then(from_epoch),
        device_id: row.try_get::<Option<i64>, _>("device_id").unwrap_or(None),
    }
}

const NOTIFICATION_COLUMNS: &str =
    "id, kind, title, body, meta, due_at, sent, sent_at, device_id";

impl NotificationScheduleRepository for SqlNotificationScheduleRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing notification schedule schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS notification_schedules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                meta TEXT,
                due_at INTEGER NOT NULL,
                sent INTEGER NOT NULL DEFAULT 0,
                sent_at INTEGER,
                device_id INTEGER,
                created_at INTEGER NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Notification schedule schema initialized successfully");
        Ok(())
    }

    async fn create(
        &self,
        notification: NewScheduledNotification,
        now: DateTime<Utc>,
    ) -> Result<ScheduledNotification, DbError> {
        debug!(
            "Creating {} notification due at {}",
            notification.kind, notification.due_at
        );

        let meta_json = notification
            .meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let query = r#"
            INSERT INTO notification_schedules (kind, title, body, meta, due_at, device_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(notification.kind.as_str())
            .bind(&notification.title)
            .bind(&notification.body)
            .bind(meta_json)
            .bind(to_epoch(notification.due_at))
            .bind(notification.device_id)
            .bind(to_epoch(now))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert scheduled notification: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(ScheduledNotification {
            id: row.try_get("id").ok(),
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            meta: notification.meta,
            due_at: notification.due_at,
            sent: false,
            sent_at: None,
            device_id: notification.device_id,
        })
    }

    async fn due_prayer_reminders(&self, now: DateTime<Utc>) -> Result<Vec<DueReminder>, DbError> {
        let query = r#"
            SELECT n.id, n.kind, n.title, n.body, n.meta, n.due_at, n.sent, n.sent_at,
                   n.device_id, d.token AS device_token
            FROM notification_schedules n
            LEFT JOIN devices d ON d.id = n.device_id
            WHERE n.kind = 'AZAN' AND n.due_at <= $1 AND n.sent = 0
        "#;

        let rows = sqlx::query(query)
            .bind(to_epoch(now))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to query due prayer reminders: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(rows
            .iter()
            .map(|row| DueReminder {
                notification: row_to_notification(row),
                device_token: row
                    .try_get::<Option<String>, _>("device_token")
                    .unwrap_or(None),
            })
            .collect())
    }

    async fn due_broadcasts(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledNotification>, DbError> {
        let query = format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notification_schedules
            WHERE kind <> 'AZAN' AND due_at <= $1 AND sent = 0
        "#
        );

        let rows = sqlx::query(&query)
            .bind(to_epoch(now))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to query due broadcasts: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(rows.iter().map(row_to_notification).collect())
    }

    async fn mark_sent(&self, id: i64, at: DateTime<Utc>) -> Result<bool, DbError> {
        // The `AND sent = 0` guard makes the claim atomic; a record can
        // only ever be claimed once.
        let query = r#"
            UPDATE notification_schedules
            SET sent = 1, sent_at = $1
            WHERE id = $2 AND sent = 0
        "#;

        let result = sqlx::query(query)
            .bind(to_epoch(at))
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to mark notification {} as sent: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM notification_schedules WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete scheduled notification {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_pending_reminders_for_device(&self, device_id: i64) -> Result<u64, DbError> {
        debug!("Clearing pending prayer reminders for device {}", device_id);

        let query = r#"
            DELETE FROM notification_schedules
            WHERE device_id = $1 AND kind = 'AZAN' AND sent = 0
        "#;

        let result = sqlx::query(query)
            .bind(device_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to clear pending reminders: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }

    async fn delete_sent_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        debug!("Deleting sent notifications older than {}", cutoff);

        let query = r#"
            DELETE FROM notification_schedules
            WHERE sent = 1 AND sent_at < $1
        "#;

        let result = sqlx::query(query)
            .bind(to_epoch(cutoff))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete old notifications: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }

    async fn list_upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledNotification>, DbError> {
        let query = format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notification_schedules
            WHERE due_at >= $1 AND sent = 0
            ORDER BY due_at ASC
        "#
        );

        let rows = sqlx::query(&query)
            .bind(to_epoch(now))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list upcoming notifications: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(rows.iter().map(row_to_notification).collect())
    }
}
