#![allow(dead_code)]
use utoipa::OpenApi;

use deenify_db::{Ayah, AyahWithSurah, Surah, SurahWithAyahs};

/// OpenAPI documentation for the Quran endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::get_all_surahs_handler,
        crate::handlers::get_surah_handler,
        crate::handlers::get_ayah_handler,
    ),
    components(schemas(Surah, Ayah, SurahWithAyahs, AyahWithSurah)),
    tags((name = "Quran", description = "Quran text"))
)]
pub struct QuranApiDoc;
