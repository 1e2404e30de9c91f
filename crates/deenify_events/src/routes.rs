use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::handlers::{
    create_event_handler, delete_event_handler, get_all_events_handler, get_event_handler,
    get_upcoming_events_handler, update_event_handler, EventsState,
};

/// Create the event routes for the API.
pub fn routes(state: Arc<EventsState>) -> Router {
    info!("Events routes initialized");

    Router::new()
        .route(
            "/events",
            get(get_all_events_handler).post(create_event_handler),
        )
        .route("/events/upcoming", get(get_upcoming_events_handler))
        .route(
            "/events/{id}",
            get(get_event_handler)
                .put(update_event_handler)
                .delete(delete_event_handler),
        )
        .with_state(state)
}
