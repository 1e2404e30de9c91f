use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use deenify_config::AppConfig;
use deenify_db::{
    DbError, IslamicEvent, IslamicEventRepository, NewIslamicEvent, SqlIslamicEventRepository,
    UpdateIslamicEvent,
};
use std::sync::Arc;
use tracing::error;

// Shared state for the event endpoints
#[derive(Clone)]
pub struct EventsState {
    pub config: Arc<AppConfig>,
    pub events: Arc<SqlIslamicEventRepository>,
}

fn internal(context: &str, e: DbError) -> (StatusCode, String) {
    error!("{}: {}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

/// Handler to list all events, newest first.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/events",
    responses((status = 200, description = "All events", body = [IslamicEvent])),
    tag = "Events"
))]
pub async fn get_all_events_handler(
    State(state): State<Arc<EventsState>>,
) -> Result<Json<Vec<IslamicEvent>>, (StatusCode, String)> {
    state
        .events
        .find_all()
        .await
        .map(Json)
        .map_err(|e| internal("Failed to fetch events", e))
}

/// Handler to list upcoming events.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/events/upcoming",
    responses((status = 200, description = "Upcoming events", body = [IslamicEvent])),
    tag = "Events"
))]
pub async fn get_upcoming_events_handler(
    State(state): State<Arc<EventsState>>,
) -> Result<Json<Vec<IslamicEvent>>, (StatusCode, String)> {
    state
        .events
        .find_upcoming(Utc::now())
        .await
        .map(Json)
        .map_err(|e| internal("Failed to fetch upcoming events", e))
}

/// Handler to fetch a single event.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "The event", body = IslamicEvent),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
))]
pub async fn get_event_handler(
    State(state): State<Arc<EventsState>>,
    Path(id): Path<i64>,
) -> Result<Json<IslamicEvent>, (StatusCode, String)> {
    let event = state
        .events
        .find_by_id(id)
        .await
        .map_err(|e| internal("Failed to fetch event", e))?;

    event
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Event not found".to_string()))
}

/// Handler to create an event.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/events",
    request_body = NewIslamicEvent,
    responses(
        (status = 201, description = "Event created", body = IslamicEvent),
        (status = 400, description = "Bad request")
    ),
    tag = "Events"
))]
pub async fn create_event_handler(
    State(state): State<Arc<EventsState>>,
    Json(request): Json<NewIslamicEvent>,
) -> Result<(StatusCode, Json<IslamicEvent>), (StatusCode, String)> {
    if request.name.trim().is_empty() || request.date_hijri.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Name and date_hijri are required".to_string(),
        ));
    }

    state
        .events
        .create(request, Utc::now())
        .await
        .map(|event| (StatusCode::CREATED, Json(event)))
        .map_err(|e| internal("Failed to create event", e))
}

/// Handler to update an event.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    request_body = UpdateIslamicEvent,
    responses(
        (status = 200, description = "Event updated", body = IslamicEvent),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
))]
pub async fn update_event_handler(
    State(state): State<Arc<EventsState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateIslamicEvent>,
) -> Result<Json<IslamicEvent>, (StatusCode, String)> {
    state.events.update(id, request).await.map(Json).map_err(|e| match e {
        DbError::NotFound(_) => (StatusCode::NOT_FOUND, "Event not found".to_string()),
        other => internal("Failed to update event", other),
    })
}

/// Handler to delete an event.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
))]
pub async fn delete_event_handler(
    State(state): State<Arc<EventsState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let deleted = state
        .events
        .delete(id)
        .await
        .map_err(|e| internal("Failed to delete event", e))?;

    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Event not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
