#![allow(dead_code)]
use utoipa::OpenApi;

use crate::client::{FcmMessage, Message, Notification};
use crate::handlers::{
    RegisterDeviceRequest, ScheduleNotificationRequest, SendNotificationRequest,
    SendNotificationResponse, StatusResponse, TestNotificationRequest, TopicNotificationRequest,
};
use deenify_common::models::{Device, EnabledPrayers, NotificationKind, ScheduledNotification};
use deenify_common::services::NotificationResult;
use deenify_db::DevicePreferencesUpdate;

/// OpenAPI documentation for the device and notification endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::send_notification_handler,
        crate::handlers::register_device_handler,
        crate::handlers::update_preferences_handler,
        crate::handlers::get_device_handler,
        crate::handlers::unregister_device_handler,
        crate::handlers::test_notification_handler,
        crate::handlers::send_topic_notification_handler,
        crate::handlers::schedule_notification_handler,
        crate::handlers::list_scheduled_handler,
        crate::handlers::delete_scheduled_handler,
    ),
    components(schemas(
        FcmMessage,
        Message,
        Notification,
        SendNotificationRequest,
        SendNotificationResponse,
        RegisterDeviceRequest,
        TestNotificationRequest,
        TopicNotificationRequest,
        ScheduleNotificationRequest,
        StatusResponse,
        Device,
        EnabledPrayers,
        NotificationKind,
        ScheduledNotification,
        NotificationResult,
        DevicePreferencesUpdate,
    )),
    tags(
        (name = "Firebase", description = "Raw FCM dispatch"),
        (name = "Device", description = "Device registry"),
        (name = "Notification", description = "Broadcast notifications")
    )
)]
pub struct FirebaseApiDoc;
