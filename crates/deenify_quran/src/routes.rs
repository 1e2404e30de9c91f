use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::handlers::{get_all_surahs_handler, get_ayah_handler, get_surah_handler, QuranState};

/// Create the Quran routes for the API.
pub fn routes(state: Arc<QuranState>) -> Router {
    info!("Quran routes initialized");

    Router::new()
        .route("/quran/surah", get(get_all_surahs_handler))
        .route("/quran/surah/{id}", get(get_surah_handler))
        .route("/quran/ayah/{surah_id}/{ayah_number}", get(get_ayah_handler))
        .with_state(state)
}
