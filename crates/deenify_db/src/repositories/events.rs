//! Repository for Islamic calendar events

use crate::error::DbError;
use crate::repositories::{from_epoch, to_epoch};
use crate::DbClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// An Islamic calendar event, dated in the Hijri calendar with an
/// estimated Gregorian date for sorting and reminders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IslamicEvent {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub date_hijri: String,
    pub estimated_gregorian: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Creation payload for an event.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewIslamicEvent {
    pub name: String,
    pub description: Option<String>,
    pub date_hijri: String,
    pub estimated_gregorian: Option<DateTime<Utc>>,
}

/// Partial update; None fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateIslamicEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_hijri: Option<String>,
    pub estimated_gregorian: Option<DateTime<Utc>>,
}

/// Repository for Islamic events
pub trait IslamicEventRepository: Send + Sync {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn create(
        &self,
        event: NewIslamicEvent,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<IslamicEvent, DbError>> + Send;

    /// All events, newest first.
    fn find_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<IslamicEvent>, DbError>> + Send;

    fn find_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<IslamicEvent>, DbError>> + Send;

    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] when the event does not exist.
    fn update(
        &self,
        id: i64,
        update: UpdateIslamicEvent,
    ) -> impl std::future::Future<Output = Result<IslamicEvent, DbError>> + Send;

    /// Returns `true` if a row was deleted.
    fn delete(&self, id: i64)
        -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Events with an estimated Gregorian date at or after `now`,
    /// soonest first.
    fn find_upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<IslamicEvent>, DbError>> + Send;
}

/// SQL implementation of the Islamic event repository
#[derive(Debug, Clone)]
pub struct SqlIslamicEventRepository {
    db_client: DbClient,
}

impl SqlIslamicEventRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn row_to_event(row: &AnyRow) -> IslamicEvent {
    IslamicEvent {
        id: row.try_get("id").ok(),
        name: row.try_get("name").unwrap_or_default(),
        description: row
            .try_get::<Option<String>, _>("description")
            .unwrap_or(None),
        date_hijri: row.try_get("date_hijri").unwrap_or_default(),
        estimated_gregorian: row
            .try_get::<Option<i64>, _>("estimated_gregorian")
            .unwrap_or(None)
            .and_then(from_epoch),
        created_at: row.try_get::<i64, _>("created_at").ok().and_then(from_epoch),
    }
}

const EVENT_COLUMNS: &str = "id, name, description, date_hijri, estimated_gregorian, created_at";

impl IslamicEventRepository for SqlIslamicEventRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing Islamic events schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS islamic_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                date_hijri TEXT NOT NULL,
                estimated_gregorian INTEGER,
                created_at INTEGER NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Islamic events schema initialized successfully");
        Ok(())
    }

    async fn create(
        &self,
        event: NewIslamicEvent,
        now: DateTime<Utc>,
    ) -> Result<IslamicEvent, DbError> {
        debug!("Creating event: {}", event.name);

        let query = r#"
            INSERT INTO islamic_events (name, description, date_hijri, estimated_gregorian, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(&event.name)
            .bind(&event.description)
            .bind(&event.date_hijri)
            .bind(event.estimated_gregorian.map(to_epoch))
            .bind(to_epoch(now))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to create event: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        info!("Event created: {}", event.name);
        Ok(IslamicEvent {
            id: row.try_get("id").ok(),
            name: event.name,
            description: event.description,
            date_hijri: event.date_hijri,
            estimated_gregorian: event.estimated_gregorian,
            created_at: Some(now),
        })
    }

    async fn find_all(&self) -> Result<Vec<IslamicEvent>, DbError> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM islamic_events ORDER BY created_at DESC"
        );

        let rows = sqlx::query(&query)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list events: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(rows.iter().map(row_to_event).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<IslamicEvent>, DbError> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM islamic_events WHERE id = $1");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to fetch event {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(row.as_ref().map(row_to_event))
    }

    async fn update(&self, id: i64, update: UpdateIslamicEvent) -> Result<IslamicEvent, DbError> {
        let mut event = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("event not found: {}", id)))?;

        if let Some(name) = update.name {
            event.name = name;
        }
        if update.description.is_some() {
            event.description = update.description;
        }
        if let Some(date_hijri) = update.date_hijri {
            event.date_hijri = date_hijri;
        }
        if update.estimated_gregorian.is_some() {
            event.estimated_gregorian = update.estimated_gregorian;
        }

        let query = r#"
            UPDATE islamic_events
            SET name = $1, description = $2, date_hijri = $3, estimated_gregorian = $4
            WHERE id = $5
        "#;

        sqlx::query(query)
            .bind(&event.name)
            .bind(&event.description)
            .bind(&event.date_hijri)
            .bind(event.estimated_gregorian.map(to_epoch))
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update event {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        info!("Event updated: {}", event.name);
        Ok(event)
    }

    async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM islamic_events WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete event {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<IslamicEvent>, DbError> {
        let query = format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM islamic_events
            WHERE estimated_gregorian >= $1
            ORDER BY estimated_gregorian ASC
        "#
        );

        let rows = sqlx::query(&query)
            .bind(to_epoch(now))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list upcoming events: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(rows.iter().map(row_to_event).collect())
    }
}
