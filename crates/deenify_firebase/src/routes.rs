use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::{
    delete_scheduled_handler, get_device_handler, list_scheduled_handler,
    register_device_handler, schedule_notification_handler, send_notification_handler,
    send_topic_notification_handler, test_notification_handler, unregister_device_handler,
    update_preferences_handler, FirebaseState,
};

/// Create the device and notification routes for the API.
///
/// The state (gateway, repositories, scheduler) is constructed once by
/// the backend at startup and injected here.
pub fn routes(state: Arc<FirebaseState>) -> Router {
    info!("Firebase routes initialized");

    Router::new()
        .route(
            "/firebase/send-notification",
            post(send_notification_handler),
        )
        .route("/device/register", post(register_device_handler))
        .route("/device/test-notification", post(test_notification_handler))
        .route(
            "/device/{token}/preferences",
            put(update_preferences_handler),
        )
        .route(
            "/device/{token}",
            get(get_device_handler).delete(unregister_device_handler),
        )
        .route(
            "/notification/send",
            post(send_topic_notification_handler),
        )
        .route(
            "/notification/schedule",
            post(schedule_notification_handler),
        )
        .route("/notification/scheduled", get(list_scheduled_handler))
        .route(
            "/notification/scheduled/{id}",
            delete(delete_scheduled_handler),
        )
        .with_state(state)
}
