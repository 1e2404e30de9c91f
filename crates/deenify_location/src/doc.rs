#![allow(dead_code)]
use utoipa::OpenApi;

use deenify_db::CachedLocation;

/// OpenAPI documentation for the location endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(crate::handlers::reverse_geocode_handler),
    components(schemas(CachedLocation)),
    tags((name = "Location", description = "Reverse geocoding"))
)]
pub struct LocationApiDoc;
