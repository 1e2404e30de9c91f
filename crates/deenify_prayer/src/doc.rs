#![allow(dead_code)]
use utoipa::OpenApi;

use deenify_common::models::PrayerTimesSnapshot;

/// OpenAPI documentation for the prayer endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(crate::handlers::get_today_handler),
    components(schemas(PrayerTimesSnapshot)),
    tags((name = "Prayer", description = "Daily prayer times"))
)]
pub struct PrayerApiDoc;
