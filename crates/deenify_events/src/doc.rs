#![allow(dead_code)]
use utoipa::OpenApi;

use deenify_db::{IslamicEvent, NewIslamicEvent, UpdateIslamicEvent};

/// OpenAPI documentation for the event endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::get_all_events_handler,
        crate::handlers::get_upcoming_events_handler,
        crate::handlers::get_event_handler,
        crate::handlers::create_event_handler,
        crate::handlers::update_event_handler,
        crate::handlers::delete_event_handler,
    ),
    components(schemas(IslamicEvent, NewIslamicEvent, UpdateIslamicEvent)),
    tags((name = "Events", description = "Islamic calendar events"))
)]
pub struct EventsApiDoc;
