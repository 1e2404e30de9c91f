//! Repository for cached prayer time snapshots
//!
//! At most one snapshot exists per calendar date; the cache key is the
//! date alone. Dates are stored as ISO "YYYY-MM-DD" text, which keeps the
//! `date < $1` purge comparison correct lexically.

use crate::error::DbError;
use crate::repositories::to_epoch;
use crate::DbClient;
use chrono::{DateTime, NaiveDate, Utc};
use deenify_common::models::PrayerTimesSnapshot;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for prayer time snapshots
pub trait PrayerCacheRepository: Send + Sync {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// The snapshot for the given date, if cached.
    fn find_by_date(
        &self,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Option<PrayerTimesSnapshot>, DbError>> + Send;

    /// Store a snapshot for its date. Snapshots are read-only after
    /// insertion.
    fn insert(
        &self,
        snapshot: &PrayerTimesSnapshot,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Delete every snapshot for a date before `date`.
    fn delete_before(
        &self,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<u64, DbError>> + Send;
}

/// SQL implementation of the prayer cache repository
#[derive(Debug, Clone)]
pub struct SqlPrayerCacheRepository {
    db_client: DbClient,
}

impl SqlPrayerCacheRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn row_to_snapshot(row: &AnyRow) -> Option<PrayerTimesSnapshot> {
    let date_raw: String = row.try_get("date").ok()?;
    let date = NaiveDate::parse_from_str(&date_raw, DATE_FORMAT).ok()?;

    Some(PrayerTimesSnapshot {
        date,
        fajr: row.try_get("fajr").unwrap_or_default(),
        dhuhr: row.try_get("dhuhr").unwrap_or_default(),
        asr: row.try_get("asr").unwrap_or_default(),
        maghrib: row.try_get("maghrib").unwrap_or_default(),
        isha: row.try_get("isha").unwrap_or_default(),
    })
}

impl PrayerCacheRepository for SqlPrayerCacheRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing prayer cache schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS prayer_cache (
                date TEXT PRIMARY KEY,
                fajr TEXT NOT NULL,
                dhuhr TEXT NOT NULL,
                asr TEXT NOT NULL,
                maghrib TEXT NOT NULL,
                isha TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Prayer cache schema initialized successfully");
        Ok(())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<PrayerTimesSnapshot>, DbError> {
        let query = r#"
            SELECT date, fajr, dhuhr, asr, maghrib, isha
            FROM prayer_cache
            WHERE date = $1
        "#;

        let row = sqlx::query(query)
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to read prayer cache: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(row.as_ref().and_then(row_to_snapshot))
    }

    async fn insert(
        &self,
        snapshot: &PrayerTimesSnapshot,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        debug!("Caching prayer times for {}", snapshot.date);

        let query = r#"
            INSERT INTO prayer_cache (date, fajr, dhuhr, asr, maghrib, isha, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;

        sqlx::query(query)
            .bind(snapshot.date.format(DATE_FORMAT).to_string())
            .bind(&snapshot.fajr)
            .bind(&snapshot.dhuhr)
            .bind(&snapshot.asr)
            .bind(&snapshot.maghrib)
            .bind(&snapshot.isha)
            .bind(to_epoch(now))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to cache prayer times: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }

    async fn delete_before(&self, date: NaiveDate) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM prayer_cache WHERE date < $1")
            .bind(date.format(DATE_FORMAT).to_string())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to purge prayer cache: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }
}
