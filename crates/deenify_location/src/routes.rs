use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::handlers::{reverse_geocode_handler, LocationState};

/// Create the location routes for the API.
pub fn routes(state: Arc<LocationState>) -> Router {
    info!("Location routes initialized");

    Router::new()
        .route("/location/reverse", get(reverse_geocode_handler))
        .with_state(state)
}
