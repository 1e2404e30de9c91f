use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::handlers::{get_today_handler, PrayerState};

/// Create the prayer routes for the API.
///
/// The state (config plus the cached prayer times provider) is built by
/// the backend at startup and shared with the scheduler.
pub fn routes(state: Arc<PrayerState>) -> Router {
    info!("Prayer routes initialized");

    Router::new()
        .route("/prayer/today", get(get_today_handler))
        .with_state(state)
}
