//! HTTP handlers for devices and push notifications
//!
//! Device registration and preference updates trigger an immediate
//! best-effort recompute of that device's prayer reminders; a failure
//! there never fails the registration itself.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use deenify_common::models::{Device, NotificationKind, ScheduledNotification};
use deenify_common::services::{NotificationGateway, NotificationResult};
use deenify_config::AppConfig;
use deenify_db::{
    DbError, DevicePreferencesUpdate, DeviceRepository, NewDevice, SqlDeviceRepository,
    SqlNotificationScheduleRepository,
};
use deenify_prayer::SqlPrayerNotificationScheduler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::FirebaseError;
use crate::gateway::FirebasePushGateway;
use crate::logic::NotificationScheduleService;

/// Shared state for the device and notification handlers
#[derive(Clone)]
pub struct FirebaseState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<FirebasePushGateway>,
    pub devices: Arc<SqlDeviceRepository>,
    pub notifications: Arc<NotificationScheduleService<SqlNotificationScheduleRepository>>,
    pub scheduler: Arc<SqlPrayerNotificationScheduler>,
}

/// Request body for the raw send endpoint.
///
/// Exactly one of `token` or `topic` must be provided.
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendNotificationRequest {
    /// Registration token of the target device
    pub token: Option<String>,
    /// Topic the target devices are subscribed to
    pub topic: Option<String>,
    pub title: String,
    pub body: String,
    /// Custom key-value data; values are stringified before delivery
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendNotificationResponse {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterDeviceRequest {
    /// The FCM registration token
    pub token: String,
    pub device_id: Option<String>,
    pub platform: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TestNotificationRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TopicNotificationRequest {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub meta: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScheduleNotificationRequest {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// When the notification becomes due; must be in the future
    pub schedule_at: DateTime<Utc>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub meta: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

fn require_firebase(config: &AppConfig) -> Result<(), (StatusCode, String)> {
    if config.use_firebase {
        Ok(())
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Push notification service is disabled.".to_string(),
        ))
    }
}

/// Recompute the device's prayer reminders after a registration or
/// preference change. Best-effort: the HTTP operation already succeeded.
async fn reschedule_best_effort(state: &FirebaseState, device: &Device) {
    if !device.enable_prayer_notifications || !device.has_coordinates() {
        return;
    }
    if let Err(e) = state.scheduler.schedule_for_device(device, Utc::now()).await {
        warn!(
            "Failed to reschedule prayer notifications for device {:?}: {}",
            device.id, e
        );
    }
}

/// Handler to send a push notification to a raw token or topic.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/firebase/send-notification",
    request_body = SendNotificationRequest,
    responses(
        (status = 200, description = "Notification sent", body = SendNotificationResponse),
        (status = 400, description = "Bad request"),
        (status = 502, description = "Gateway failure")
    ),
    tag = "Firebase"
))]
pub async fn send_notification_handler(
    State(state): State<Arc<FirebaseState>>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<SendNotificationResponse>, (StatusCode, String)> {
    require_firebase(&state.config)?;

    let result = match (request.token.as_deref(), request.topic.as_deref()) {
        (Some(token), None) => {
            state
                .gateway
                .send_to_device(token, &request.title, &request.body, request.data.as_ref())
                .await
        }
        (None, Some(topic)) => {
            state
                .gateway
                .send_to_topic(topic, &request.title, &request.body, request.data.as_ref())
                .await
        }
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Either token or topic must be provided, but not both".to_string(),
            ));
        }
    };

    match result {
        Ok(sent) => Ok(Json(SendNotificationResponse {
            success: true,
            message_id: Some(sent.id),
            error: None,
        })),
        Err(e) => {
            error!("Failed to send notification: {}", e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

/// Handler to register (or re-register) a device.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/device/register",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 201, description = "Device registered", body = Device),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal error")
    ),
    tag = "Device"
))]
pub async fn register_device_handler(
    State(state): State<Arc<FirebaseState>>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), (StatusCode, String)> {
    if request.token.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "FCM token is required".to_string()));
    }
    if request.latitude.is_some() != request.longitude.is_some() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Latitude and longitude must be provided together".to_string(),
        ));
    }

    let device = state
        .devices
        .register(
            NewDevice {
                token: request.token,
                device_id: request.device_id,
                platform: request.platform,
                latitude: request.latitude,
                longitude: request.longitude,
                timezone: request.timezone,
            },
            Utc::now(),
        )
        .await
        .map_err(|e| {
            error!("Failed to register device: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to register device".to_string(),
            )
        })?;

    info!("Device registered/updated: {:?}", device.id);

    // Schedule today's reminders right away for the newly registered
    // device; registration has already succeeded regardless.
    reschedule_best_effort(&state, &device).await;

    Ok((StatusCode::CREATED, Json(device)))
}

/// Handler to update a device's notification preferences.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/device/{token}/preferences",
    params(("token" = String, Path, description = "Device push token")),
    request_body = DevicePreferencesUpdate,
    responses(
        (status = 200, description = "Preferences updated", body = Device),
        (status = 404, description = "Device not found")
    ),
    tag = "Device"
))]
pub async fn update_preferences_handler(
    State(state): State<Arc<FirebaseState>>,
    Path(token): Path<String>,
    Json(update): Json<DevicePreferencesUpdate>,
) -> Result<Json<Device>, (StatusCode, String)> {
    if update.latitude.is_some() != update.longitude.is_some() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Latitude and longitude must be updated together".to_string(),
        ));
    }
    if update.notify_before_prayer.is_some_and(|minutes| minutes < 0) {
        return Err((
            StatusCode::BAD_REQUEST,
            "notify_before_prayer must not be negative".to_string(),
        ));
    }

    let device = state
        .devices
        .update_preferences(&token, update, Utc::now())
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => (StatusCode::NOT_FOUND, "Device not found".to_string()),
            other => {
                error!("Failed to update device preferences: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to update device preferences".to_string(),
                )
            }
        })?;

    info!("Device preferences updated: {:?}", device.id);

    // Reschedule so the stored plan reflects the new preferences.
    reschedule_best_effort(&state, &device).await;

    Ok(Json(device))
}

/// Handler to fetch a device registration.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/device/{token}",
    params(("token" = String, Path, description = "Device push token")),
    responses(
        (status = 200, description = "Device info", body = Device),
        (status = 404, description = "Device not found")
    ),
    tag = "Device"
))]
pub async fn get_device_handler(
    State(state): State<Arc<FirebaseState>>,
    Path(token): Path<String>,
) -> Result<Json<Device>, (StatusCode, String)> {
    let device = state.devices.find_by_token(&token).await.map_err(|e| {
        error!("Failed to fetch device info: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch device info".to_string(),
        )
    })?;

    device
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Device not found".to_string()))
}

/// Handler to unregister a device.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/device/{token}",
    params(("token" = String, Path, description = "Device push token")),
    responses(
        (status = 200, description = "Device unregistered", body = StatusResponse),
        (status = 404, description = "Device not found")
    ),
    tag = "Device"
))]
pub async fn unregister_device_handler(
    State(state): State<Arc<FirebaseState>>,
    Path(token): Path<String>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let deleted = state.devices.delete_by_token(&token).await.map_err(|e| {
        error!("Failed to unregister device: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to unregister device".to_string(),
        )
    })?;

    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Device not found".to_string()));
    }

    info!("Device unregistered: {}", token);
    Ok(Json(StatusResponse {
        success: true,
        message: "Device unregistered successfully".to_string(),
    }))
}

/// Handler to send a test notification to a device.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/device/test-notification",
    request_body = TestNotificationRequest,
    responses(
        (status = 200, description = "Test notification sent", body = SendNotificationResponse),
        (status = 502, description = "Gateway failure")
    ),
    tag = "Device"
))]
pub async fn test_notification_handler(
    State(state): State<Arc<FirebaseState>>,
    Json(request): Json<TestNotificationRequest>,
) -> Result<Json<SendNotificationResponse>, (StatusCode, String)> {
    require_firebase(&state.config)?;

    if request.token.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Token required".to_string()));
    }

    info!("Testing notification for token: {}", request.token);

    let sent = state
        .gateway
        .send_to_device(
            &request.token,
            "Tes Notifikasi",
            "Ini adalah tes notifikasi dari server untuk memastikan koneksi berhasil.",
            None,
        )
        .await
        .map_err(|e| {
            error!("Test notification failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    Ok(Json(SendNotificationResponse {
        success: true,
        message_id: Some(sent.id),
        error: None,
    }))
}

/// Handler to send a broadcast notification to its kind's topic now.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/notification/send",
    request_body = TopicNotificationRequest,
    responses(
        (status = 201, description = "Notification sent", body = NotificationResult),
        (status = 502, description = "Gateway failure")
    ),
    tag = "Notification"
))]
pub async fn send_topic_notification_handler(
    State(state): State<Arc<FirebaseState>>,
    Json(request): Json<TopicNotificationRequest>,
) -> Result<(StatusCode, Json<NotificationResult>), (StatusCode, String)> {
    require_firebase(&state.config)?;

    let result = state
        .notifications
        .send_to_topic_now(
            request.kind,
            &request.title,
            &request.body,
            request.meta.as_ref(),
        )
        .await
        .map_err(|e| {
            error!("Failed to send notification: {}", e);
            (StatusCode::BAD_GATEWAY, "Failed to send notification".to_string())
        })?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// Handler to schedule a broadcast notification for later dispatch.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/notification/schedule",
    request_body = ScheduleNotificationRequest,
    responses(
        (status = 201, description = "Notification scheduled", body = ScheduledNotification),
        (status = 400, description = "Bad request")
    ),
    tag = "Notification"
))]
pub async fn schedule_notification_handler(
    State(state): State<Arc<FirebaseState>>,
    Json(request): Json<ScheduleNotificationRequest>,
) -> Result<(StatusCode, Json<ScheduledNotification>), (StatusCode, String)> {
    let now = Utc::now();
    if request.schedule_at <= now {
        return Err((
            StatusCode::BAD_REQUEST,
            "schedule_at must be in the future".to_string(),
        ));
    }

    let notification = state
        .notifications
        .schedule(
            request.kind,
            request.title,
            request.body,
            request.schedule_at,
            request.meta,
            now,
        )
        .await
        .map_err(|e| {
            error!("Failed to schedule notification: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to schedule notification".to_string(),
            )
        })?;

    Ok((StatusCode::CREATED, Json(notification)))
}

/// Handler to list upcoming scheduled notifications.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/notification/scheduled",
    responses(
        (status = 200, description = "Upcoming scheduled notifications", body = [ScheduledNotification])
    ),
    tag = "Notification"
))]
pub async fn list_scheduled_handler(
    State(state): State<Arc<FirebaseState>>,
) -> Result<Json<Vec<ScheduledNotification>>, (StatusCode, String)> {
    let notifications = state
        .notifications
        .list_upcoming(Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to fetch scheduled notifications: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch scheduled notifications".to_string(),
            )
        })?;

    Ok(Json(notifications))
}

/// Handler to delete a scheduled notification.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/notification/scheduled/{id}",
    params(("id" = i64, Path, description = "Scheduled notification id")),
    responses(
        (status = 200, description = "Scheduled notification deleted", body = StatusResponse),
        (status = 404, description = "Not found")
    ),
    tag = "Notification"
))]
pub async fn delete_scheduled_handler(
    State(state): State<Arc<FirebaseState>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    state.notifications.delete(id).await.map_err(|e| match e {
        FirebaseError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "Scheduled notification not found".to_string(),
        ),
        other => {
            error!("Failed to delete scheduled notification: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete scheduled notification".to_string(),
            )
        }
    })?;

    Ok(Json(StatusResponse {
        success: true,
        message: "Scheduled notification deleted successfully".to_string(),
    }))
}
