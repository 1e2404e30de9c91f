//! Scheduled broadcast notification service
//!
//! Ad-hoc notifications are either sent to their topic immediately or
//! parked in the schedule store with a due time. A periodic sweep
//! dispatches due records; broadcast records are single-shot and deleted
//! after a successful send rather than retained for audit.

use crate::client::FirebaseError;
use chrono::{DateTime, Utc};
use deenify_common::models::{NotificationKind, ScheduledNotification};
use deenify_common::services::{BoxedError, NotificationGateway, NotificationResult};
use deenify_db::{NewScheduledNotification, NotificationScheduleRepository};
use std::sync::Arc;
use tracing::{error, info};

/// Service over the broadcast side of the schedule store.
pub struct NotificationScheduleService<S> {
    schedules: Arc<S>,
    gateway: Arc<dyn NotificationGateway<Error = BoxedError>>,
}

impl<S: NotificationScheduleRepository> NotificationScheduleService<S> {
    pub fn new(
        schedules: Arc<S>,
        gateway: Arc<dyn NotificationGateway<Error = BoxedError>>,
    ) -> Self {
        Self { schedules, gateway }
    }

    /// Send a notification to the kind's topic right now, without touching
    /// the store.
    pub async fn send_to_topic_now(
        &self,
        kind: NotificationKind,
        title: &str,
        body: &str,
        meta: Option<&serde_json::Value>,
    ) -> Result<NotificationResult, FirebaseError> {
        self.gateway
            .send_to_topic(kind.topic(), title, body, meta)
            .await
            .map_err(|e| FirebaseError::ApiError(e.to_string()))
    }

    /// Park a notification in the store for later dispatch by the sweep.
    pub async fn schedule(
        &self,
        kind: NotificationKind,
        title: String,
        body: String,
        due_at: DateTime<Utc>,
        meta: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<ScheduledNotification, FirebaseError> {
        let notification = self
            .schedules
            .create(
                NewScheduledNotification {
                    kind,
                    title,
                    body,
                    meta,
                    due_at,
                    device_id: None,
                },
                now,
            )
            .await?;

        info!("Notification scheduled: {:?}", notification.id);
        Ok(notification)
    }

    /// Undelivered notifications with a due time at or after `now`,
    /// soonest first.
    pub async fn list_upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledNotification>, FirebaseError> {
        Ok(self.schedules.list_upcoming(now).await?)
    }

    /// Delete a scheduled notification by id.
    pub async fn delete(&self, id: i64) -> Result<(), FirebaseError> {
        if self.schedules.delete(id).await? {
            info!("Scheduled notification deleted: {}", id);
            Ok(())
        } else {
            Err(FirebaseError::NotFound(format!(
                "scheduled notification not found: {}",
                id
            )))
        }
    }

    /// Dispatch every due, unsent broadcast record (kind != AZAN) to its
    /// topic and delete it on success.
    ///
    /// A failed dispatch leaves its record due for the next sweep and
    /// never aborts the rest of the batch. Returns the number
    /// successfully dispatched.
    pub async fn process_due_broadcasts(&self, now: DateTime<Utc>) -> Result<u32, FirebaseError> {
        let due = self.schedules.due_broadcasts(now).await?;

        if due.is_empty() {
            return Ok(0);
        }

        info!("Processing {} pending broadcast notifications", due.len());

        let mut sent = 0u32;
        for notification in due {
            let result = self
                .gateway
                .send_to_topic(
                    notification.kind.topic(),
                    &notification.title,
                    &notification.body,
                    notification.meta.as_ref(),
                )
                .await;

            match result {
                Ok(_) => {
                    // Broadcasts are single-shot: delete instead of flag.
                    if let Some(id) = notification.id {
                        if let Err(e) = self.schedules.delete(id).await {
                            error!("Failed to delete sent broadcast {}: {}", id, e);
                        }
                    }
                    sent += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to send broadcast notification {:?}: {}",
                        notification.id, e
                    );
                }
            }
        }

        info!("Sent {} broadcast notifications", sent);
        Ok(sent)
    }
}
