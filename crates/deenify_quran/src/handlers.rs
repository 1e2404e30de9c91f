use crate::logic::{QuranError, QuranService};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use deenify_common::error::{internal_error, not_found, validation_error, DeenifyError};
use deenify_common::http::map_json_error;
use deenify_config::AppConfig;
use deenify_db::{AyahWithSurah, SqlQuranRepository, Surah, SurahWithAyahs};
use std::sync::Arc;
use tracing::error;

// Shared state for the Quran endpoints
#[derive(Clone)]
pub struct QuranState {
    pub config: Arc<AppConfig>,
    pub service: Arc<QuranService<SqlQuranRepository>>,
}

fn to_common(context: &'static str) -> impl FnOnce(QuranError) -> DeenifyError {
    move |e| match e {
        QuranError::NotFound(message) => not_found(message),
        other => {
            error!("{}: {}", context, other);
            internal_error(context)
        }
    }
}

/// Handler to list all surahs.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/quran/surah",
    responses((status = 200, description = "All surahs", body = [Surah])),
    tag = "Quran"
))]
pub async fn get_all_surahs_handler(
    State(state): State<Arc<QuranState>>,
) -> Result<Json<Vec<Surah>>, Response> {
    map_json_error(
        state.service.all_surahs().await,
        to_common("Failed to fetch surahs"),
    )
}

/// Handler to fetch one surah with its ayahs.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/quran/surah/{id}",
    params(("id" = i64, Path, description = "Surah number, 1-114")),
    responses(
        (status = 200, description = "Surah with ayahs", body = SurahWithAyahs),
        (status = 400, description = "Invalid surah number"),
        (status = 404, description = "Surah not found")
    ),
    tag = "Quran"
))]
pub async fn get_surah_handler(
    State(state): State<Arc<QuranState>>,
    Path(id): Path<i64>,
) -> Result<Json<SurahWithAyahs>, Response> {
    if !(1..=114).contains(&id) {
        return Err(
            validation_error("Invalid surah ID. Must be between 1 and 114").into_response(),
        );
    }

    map_json_error(
        state.service.surah_by_id(id).await,
        to_common("Failed to fetch surah"),
    )
}

/// Handler to fetch a single ayah.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/quran/ayah/{surah_id}/{ayah_number}",
    params(
        ("surah_id" = i64, Path, description = "Surah number"),
        ("ayah_number" = i64, Path, description = "Ayah number within the surah")
    ),
    responses(
        (status = 200, description = "The ayah", body = AyahWithSurah),
        (status = 404, description = "Ayah not found")
    ),
    tag = "Quran"
))]
pub async fn get_ayah_handler(
    State(state): State<Arc<QuranState>>,
    Path((surah_id, ayah_number)): Path<(i64, i64)>,
) -> Result<Json<AyahWithSurah>, Response> {
    map_json_error(
        state.service.ayah(surah_id, ayah_number).await,
        to_common("Failed to fetch ayah"),
    )
}
