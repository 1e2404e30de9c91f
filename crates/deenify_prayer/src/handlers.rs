// --- File: crates/deenify_prayer/src/handlers.rs ---
use crate::provider::CachedPrayerTimes;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use deenify_common::models::PrayerTimesSnapshot;
use deenify_config::AppConfig;
use deenify_db::SqlPrayerCacheRepository;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

// Shared state for the prayer endpoints
#[derive(Clone)]
pub struct PrayerState {
    pub config: Arc<AppConfig>,
    pub prayer_times: Arc<CachedPrayerTimes<SqlPrayerCacheRepository>>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct PrayerTimesQuery {
    /// Latitude in decimal degrees
    #[cfg_attr(feature = "openapi", param(example = -6.2))]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[cfg_attr(feature = "openapi", param(example = 106.8))]
    pub lon: f64,
}

/// Handler to get today's prayer times for the given coordinates.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/prayer/today", // Path relative to /api
    params(PrayerTimesQuery),
    responses(
        (status = 200, description = "Today's prayer times", body = PrayerTimesSnapshot),
        (status = 400, description = "Bad request (coordinates out of range)"),
        (status = 502, description = "Prayer times source unreachable")
    ),
    tag = "Prayer"
))]
pub async fn get_today_handler(
    State(state): State<Arc<PrayerState>>,
    Query(query): Query<PrayerTimesQuery>,
) -> Result<Json<PrayerTimesSnapshot>, (StatusCode, String)> {
    // Ensure the prayer feature is enabled via runtime config
    if !state.config.use_prayer {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Prayer times service is disabled.".to_string(),
        ));
    }

    if !(-90.0..=90.0).contains(&query.lat) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&query.lon) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Longitude must be between -180 and 180".to_string(),
        ));
    }

    let snapshot = state
        .prayer_times
        .get_today(query.lat, query.lon, Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to fetch prayer times: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                "Failed to fetch prayer times".to_string(),
            )
        })?;

    Ok(Json(snapshot))
}
