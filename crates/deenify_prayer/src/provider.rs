// --- File: crates/deenify_prayer/src/provider.rs ---
//! Prayer times provider: external source plus the date-keyed cache.
//!
//! The cache is keyed by calendar date alone, not by location — every
//! caller on the same date shares one snapshot regardless of where it
//! actually is. This is a known product-level simplification carried over
//! deliberately (the app serves a single-timezone audience); do not "fix"
//! it here without widening the cache key and the product's assumptions
//! together.

use crate::logic::PrayerError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Asia::Jakarta;
use deenify_common::models::PrayerTimesSnapshot;
use deenify_common::services::{BoxFuture, BoxedError, PrayerTimesSource, PrayerTimings};
use deenify_config::PrayerConfig;
use deenify_db::PrayerCacheRepository;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_API_BASE: &str = "https://api.aladhan.com/v1";
const DEFAULT_METHOD: u32 = 2;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TimingsResponse {
    data: TimingsData,
}

#[derive(Debug, Deserialize)]
struct TimingsData {
    timings: ApiTimings,
}

#[derive(Debug, Deserialize)]
struct ApiTimings {
    #[serde(rename = "Fajr")]
    fajr: String,
    #[serde(rename = "Dhuhr")]
    dhuhr: String,
    #[serde(rename = "Asr")]
    asr: String,
    #[serde(rename = "Maghrib")]
    maghrib: String,
    #[serde(rename = "Isha")]
    isha: String,
}

/// Client for the Aladhan prayer times API.
pub struct AladhanClient {
    client: reqwest::Client,
    api_base: String,
    method: u32,
}

impl AladhanClient {
    pub fn new(config: &PrayerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_base: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            method: config.method.unwrap_or(DEFAULT_METHOD),
        }
    }
}

impl PrayerTimesSource for AladhanClient {
    type Error = BoxedError;

    fn fetch_timings(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> BoxFuture<'_, PrayerTimings, Self::Error> {
        Box::pin(async move {
            // The API takes a unix timestamp; local noon keeps the lookup
            // safely inside the requested calendar day.
            let timestamp = date
                .and_hms_opt(12, 0, 0)
                .and_then(|naive| Jakarta.from_local_datetime(&naive).single())
                .map(|dt| dt.timestamp())
                .unwrap_or_else(|| Utc::now().timestamp());

            let url = format!(
                "{}/timings/{}?latitude={}&longitude={}&method={}",
                self.api_base, timestamp, latitude, longitude, self.method
            );

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| BoxedError(Box::new(e)))?;

            if !response.status().is_success() {
                return Err(BoxedError(
                    format!("prayer times API returned {}", response.status()).into(),
                ));
            }

            let parsed: TimingsResponse = response
                .json()
                .await
                .map_err(|e| BoxedError(Box::new(e)))?;

            Ok(PrayerTimings {
                fajr: parsed.data.timings.fajr,
                dhuhr: parsed.data.timings.dhuhr,
                asr: parsed.data.timings.asr,
                maghrib: parsed.data.timings.maghrib,
                isha: parsed.data.timings.isha,
            })
        })
    }
}

/// Read-through, date-keyed cache over a prayer times source.
pub struct CachedPrayerTimes<C> {
    cache: Arc<C>,
    source: Arc<dyn PrayerTimesSource<Error = BoxedError>>,
}

impl<C: PrayerCacheRepository> CachedPrayerTimes<C> {
    pub fn new(cache: Arc<C>, source: Arc<dyn PrayerTimesSource<Error = BoxedError>>) -> Self {
        Self { cache, source }
    }

    /// The app's local calendar date for a given instant.
    pub fn local_date(now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&Jakarta).date_naive()
    }

    /// Today's prayer times: from the cache when present, otherwise
    /// fetched from the source and persisted.
    ///
    /// A source failure propagates as-is — there is no stale-data
    /// fallback.
    pub async fn get_today(
        &self,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> Result<PrayerTimesSnapshot, PrayerError> {
        let today = Self::local_date(now);

        if let Some(cached) = self.cache.find_by_date(today).await? {
            debug!("Returning cached prayer times for {}", today);
            return Ok(cached);
        }

        info!("Fetching prayer times from API for {}", today);
        let timings = self
            .source
            .fetch_timings(today, latitude, longitude)
            .await
            .map_err(|e| PrayerError::SourceError(e.to_string()))?;

        let snapshot = PrayerTimesSnapshot {
            date: today,
            fajr: timings.fajr,
            dhuhr: timings.dhuhr,
            asr: timings.asr,
            maghrib: timings.maghrib,
            isha: timings.isha,
        };

        if let Err(e) = self.cache.insert(&snapshot, now).await {
            // Two first lookups can race on the date's primary key; the
            // loser reuses whatever won.
            warn!("Failed to cache prayer times for {}: {}", today, e);
            if let Some(existing) = self.cache.find_by_date(today).await? {
                return Ok(existing);
            }
            return Err(e.into());
        }

        info!("Prayer times cached for {}", today);
        Ok(snapshot)
    }

    /// Purge snapshots for dates in the past.
    pub async fn clean_old_cache(&self, now: DateTime<Utc>) -> Result<u64, PrayerError> {
        let removed = self.cache.delete_before(Self::local_date(now)).await?;
        info!("Deleted {} old prayer cache entries", removed);
        Ok(removed)
    }
}
