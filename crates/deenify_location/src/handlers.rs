use crate::logic::{LocationError, LocationService};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use deenify_config::AppConfig;
use deenify_db::{CachedLocation, SqlLocationCacheRepository};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

// Shared state for the location endpoints
#[derive(Clone)]
pub struct LocationState {
    pub config: Arc<AppConfig>,
    pub service: Arc<LocationService<SqlLocationCacheRepository>>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ReverseGeocodeQuery {
    pub lat: f64,
    pub lon: f64,
}

/// Handler for reverse geocoding.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/location/reverse",
    params(ReverseGeocodeQuery),
    responses(
        (status = 200, description = "Resolved location", body = CachedLocation),
        (status = 400, description = "Coordinates out of range"),
        (status = 429, description = "Upstream rate limit"),
        (status = 502, description = "Upstream failure")
    ),
    tag = "Location"
))]
pub async fn reverse_geocode_handler(
    State(state): State<Arc<LocationState>>,
    Query(query): Query<ReverseGeocodeQuery>,
) -> Result<Json<CachedLocation>, (StatusCode, String)> {
    if !state.config.use_location {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Location service is disabled.".to_string(),
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

    state
        .service
        .reverse_geocode(query.lat, query.lon, Utc::now())
        .await
        .map(Json)
        .map_err(|e| {
            error!("Error in reverse geocoding: {}", e);
            match e {
                LocationError::UpstreamError { status: 401, .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid LocationIQ API key".to_string(),
                ),
                LocationError::UpstreamError { status: 429, .. } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Rate limit exceeded".to_string(),
                ),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    "Failed to fetch location data".to_string(),
                ),
            }
        })
}
