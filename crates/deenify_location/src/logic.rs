//! Reverse geocoding against LocationIQ, cached by rounded coordinates.

use chrono::{DateTime, Duration, Utc};
use deenify_config::LocationConfig;
use deenify_db::{CachedLocation, DbError, LocationCacheRepository};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://us1.locationiq.com/v1";
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Cache entries older than this are purged by the daily sweep.
const CACHE_RETENTION_DAYS: i64 = 30;

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Missing configuration: {0}")]
    ConfigError(String),
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("LocationIQ API error ({status}): {message}")]
    UpstreamError { status: u16, message: String },
    #[error("Database error: {0}")]
    DbError(#[from] DbError),
}

#[derive(Debug, Deserialize)]
struct LocationIqResponse {
    display_name: String,
    address: LocationIqAddress,
}

#[derive(Debug, Deserialize, Default)]
struct LocationIqAddress {
    road: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    county: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

/// Reverse geocoding service with a read-through cache.
pub struct LocationService<L> {
    repo: Arc<L>,
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

/// Round a coordinate to six decimals, the cache key granularity.
fn round_coordinate(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn build_address(address: &LocationIqAddress) -> String {
    let parts: Vec<&str> = [
        address.road.as_deref(),
        address.suburb.as_deref(),
        address.city.as_deref(),
        address.state.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        "Unknown Address".to_string()
    } else {
        parts.join(", ")
    }
}

impl<L: LocationCacheRepository> LocationService<L> {
    /// The LocationIQ key is a secret and comes from the environment
    /// (`LOCATIONIQ_API_KEY`), never from config files.
    pub fn new(repo: Arc<L>, config: Option<&LocationConfig>) -> Result<Self, LocationError> {
        let api_key = std::env::var("LOCATIONIQ_API_KEY").map_err(|_| {
            LocationError::ConfigError("LOCATIONIQ_API_KEY is not set".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            repo,
            client,
            api_base: config
                .and_then(|c| c.api_base_url.clone())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key,
        })
    }

    /// Resolve coordinates to an address, serving repeated lookups for
    /// the same rounded point from the cache.
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
        now: DateTime<Utc>,
    ) -> Result<CachedLocation, LocationError> {
        let rounded_lat = round_coordinate(lat);
        let rounded_lon = round_coordinate(lon);

        if let Some(cached) = self.repo.find(rounded_lat, rounded_lon).await? {
            debug!("Returning cached location data");
            return Ok(cached);
        }

        info!("Fetching location data from LocationIQ API...");
        let url = format!(
            "{}/reverse?key={}&lat={}&lon={}&format=json",
            self.api_base, self.api_key, rounded_lat, rounded_lon
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LocationError::UpstreamError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: LocationIqResponse = response.json().await?;

        let location = CachedLocation {
            lat: rounded_lat,
            lon: rounded_lon,
            address: build_address(&parsed.address),
            city: parsed
                .address
                .city
                .clone()
                .or(parsed.address.county.clone())
                .or(parsed.address.suburb.clone()),
            state: parsed.address.state.clone(),
            country: parsed.address.country.clone(),
            country_code: parsed.address.country_code.map(|c| c.to_uppercase()),
            postal_code: parsed.address.postcode.clone(),
            display_name: parsed.display_name,
        };

        self.repo.insert(&location, now).await?;
        info!("Location data cached successfully");

        Ok(location)
    }

    /// Purge cache entries past the retention window.
    pub async fn clean_old_cache(&self, now: DateTime<Utc>) -> Result<u64, LocationError> {
        let removed = self
            .repo
            .delete_created_before(now - Duration::days(CACHE_RETENTION_DAYS))
            .await?;
        info!("Deleted {} old location cache entries", removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_six_decimals() {
        assert_eq!(round_coordinate(-6.200000449), -6.2);
        assert_eq!(round_coordinate(106.81666666), 106.816667);
    }

    #[test]
    fn address_joins_known_parts_in_order() {
        let address = LocationIqAddress {
            road: Some("Jalan Sudirman".to_string()),
            city: Some("Jakarta".to_string()),
            state: Some("DKI Jakarta".to_string()),
            ..Default::default()
        };
        assert_eq!(
            build_address(&address),
            "Jalan Sudirman, Jakarta, DKI Jakarta"
        );
    }

    #[test]
    fn empty_address_falls_back() {
        assert_eq!(build_address(&LocationIqAddress::default()), "Unknown Address");
    }
}
