//! Repository for cached reverse-geocoding results
//!
//! Results are keyed by coordinates rounded to six decimals; a repeated
//! lookup for the same rounded point is served from the cache.

use crate::error::DbError;
use crate::repositories::to_epoch;
use crate::DbClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// A cached reverse-geocoding result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CachedLocation {
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub postal_code: Option<String>,
    pub display_name: String,
}

/// Repository for the location cache
pub trait LocationCacheRepository: Send + Sync {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// The cached entry for the (already rounded) coordinates, if any.
    fn find(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl std::future::Future<Output = Result<Option<CachedLocation>, DbError>> + Send;

    fn insert(
        &self,
        location: &CachedLocation,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Delete entries created before `cutoff`.
    fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, DbError>> + Send;
}

/// SQL implementation of the location cache repository
#[derive(Debug, Clone)]
pub struct SqlLocationCacheRepository {
    db_client: DbClient,
}

impl SqlLocationCacheRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn row_to_location(row: &AnyRow) -> CachedLocation {
    CachedLocation {
        lat: row.try_get("lat").unwrap_or_default(),
        lon: row.try_get("lon").unwrap_or_default(),
        address: row.try_get("address").unwrap_or_default(),
        city: row.try_get::<Option<String>, _>("city").unwrap_or(None),
        state: row.try_get::<Option<String>, _>("state").unwrap_or(None),
        country: row.try_get::<Option<String>, _>("country").unwrap_or(None),
        country_code: row
            .try_get::<Option<String>, _>("country_code")
            .unwrap_or(None),
        postal_code: row
            .try_get::<Option<String>, _>("postal_code")
            .unwrap_or(None),
        display_name: row.try_get("display_name").unwrap_or_default(),
    }
}

impl LocationCacheRepository for SqlLocationCacheRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing location cache schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS location_cache (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                address TEXT NOT NULL,
                city TEXT,
                state TEXT,
                country TEXT,
                country_code TEXT,
                postal_code TEXT,
                display_name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(lat, lon)
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Location cache schema initialized successfully");
        Ok(())
    }

    async fn find(&self, lat: f64, lon: f64) -> Result<Option<CachedLocation>, DbError> {
        let query = r#"
            SELECT lat, lon, address, city, state, country, country_code,
                   postal_code, display_name
            FROM location_cache
            WHERE lat = $1 AND lon = $2
        "#;

        let row = sqlx::query(query)
            .bind(lat)
            .bind(lon)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to read location cache: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(row.as_ref().map(row_to_location))
    }

    async fn insert(&self, location: &CachedLocation, now: DateTime<Utc>) -> Result<(), DbError> {
        debug!("Caching location for ({}, {})", location.lat, location.lon);

        let query = r#"
            INSERT INTO location_cache
                (lat, lon, address, city, state, country, country_code,
                 postal_code, display_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#;

        sqlx::query(query)
            .bind(location.lat)
            .bind(location.lon)
            .bind(&location.address)
            .bind(&location.city)
            .bind(&location.state)
            .bind(&location.country)
            .bind(&location.country_code)
            .bind(&location.postal_code)
            .bind(&location.display_name)
            .bind(to_epoch(now))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to cache location: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM location_cache WHERE created_at < $1")
            .bind(to_epoch(cutoff))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to purge location cache: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }
}
