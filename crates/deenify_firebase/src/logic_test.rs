#[cfg(test)]
mod tests {
    use crate::logic::NotificationScheduleService;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use deenify_common::models::{NotificationKind, ScheduledNotification};
    use deenify_common::services::{
        BoxFuture, BoxedError, NotificationGateway, NotificationResult,
    };
    use deenify_db::{
        DbError, DueReminder, NewScheduledNotification, NotificationScheduleRepository,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct InMemorySchedules {
        rows: Mutex<Vec<ScheduledNotification>>,
        next_id: Mutex<i64>,
    }

    impl InMemorySchedules {
        fn rows(&self) -> Vec<ScheduledNotification> {
            self.rows.lock().unwrap().clone()
        }
    }

    impl NotificationScheduleRepository for InMemorySchedules {
        async fn init_schema(&self) -> Result<(), DbError> {
            Ok(())
        }

        async fn create(
            &self,
            notification: NewScheduledNotification,
            _now: DateTime<Utc>,
        ) -> Result<ScheduledNotification, DbError> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let created = ScheduledNotification {
                id: Some(*next_id),
                kind: notification.kind,
                title: notification.title,
                body: notification.body,
                meta: notification.meta,
                due_at: notification.due_at,
                sent: false,
                sent_at: None,
                device_id: notification.device_id,
            };
            self.rows.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn due_prayer_reminders(
            &self,
            now: DateTime<Utc>,
        ) -> Result<Vec<DueReminder>, DbError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.kind == NotificationKind::Azan && n.due_at <= now && !n.sent)
                .map(|n| DueReminder {
                    notification: n.clone(),
                    device_token: None,
                })
                .collect())
        }

        async fn due_broadcasts(
            &self,
            now: DateTime<Utc>,
        ) -> Result<Vec<ScheduledNotification>, DbError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.kind != NotificationKind::Azan && n.due_at <= now && !n.sent)
                .cloned()
                .collect())
        }

        async fn mark_sent(&self, id: i64, at: DateTime<Utc>) -> Result<bool, DbError> {
            let mut rows = self.rows.lock().unwrap();
            for row in rows.iter_mut() {
                if row.id == Some(id) && !row.sent {
                    row.sent = true;
                    row.sent_at = Some(at);
                    return Ok(true);
                }
            }
            Ok(false)
        }

        async fn delete(&self, id: i64) -> Result<bool, DbError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|n| n.id != Some(id));
            Ok(rows.len() < before)
        }

        async fn delete_pending_reminders_for_device(
            &self,
            _device_id: i64,
        ) -> Result<u64, DbError> {
            Ok(0)
        }

        async fn delete_sent_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, DbError> {
            Ok(0)
        }

        async fn list_upcoming(
            &self,
            now: DateTime<Utc>,
        ) -> Result<Vec<ScheduledNotification>, DbError> {
            let mut upcoming: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.due_at >= now && !n.sent)
                .cloned()
                .collect();
            upcoming.sort_by_key(|n| n.due_at);
            Ok(upcoming)
        }
    }

    #[derive(Default)]
    struct FakeGateway {
        topic_calls: Mutex<Vec<(String, String)>>,
        fail: AtomicBool,
    }

    impl NotificationGateway for FakeGateway {
        type Error = BoxedError;

        fn send_to_device(
            &self,
            _token: &str,
            _title: &str,
            _body: &str,
            _meta: Option<&serde_json::Value>,
        ) -> BoxFuture<'_, NotificationResult, Self::Error> {
            Box::pin(async move {
                Ok(NotificationResult {
                    id: "device-message".to_string(),
                    status: "sent".to_string(),
                })
            })
        }

        fn send_to_topic(
            &self,
            topic: &str,
            title: &str,
            _body: &str,
            _meta: Option<&serde_json::Value>,
        ) -> BoxFuture<'_, NotificationResult, Self::Error> {
            let topic = topic.to_string();
            let title = title.to_string();
            Box::pin(async move {
                if self.fail.load(Ordering::SeqCst) {
                    return Err(BoxedError("gateway down".into()));
                }
                self.topic_calls.lock().unwrap().push((topic, title));
                Ok(NotificationResult {
                    id: "topic-message".to_string(),
                    status: "sent".to_string(),
                })
            })
        }
    }

    fn service() -> (
        Arc<InMemorySchedules>,
        Arc<FakeGateway>,
        NotificationScheduleService<InMemorySchedules>,
    ) {
        let schedules = Arc::new(InMemorySchedules::default());
        let gateway = Arc::new(FakeGateway::default());
        let service = NotificationScheduleService::new(
            schedules.clone(),
            gateway.clone() as Arc<dyn NotificationGateway<Error = BoxedError>>,
        );
        (schedules, gateway, service)
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn due_broadcast_is_sent_to_its_topic_and_deleted() {
        let (schedules, gateway, service) = service();
        let now = at(12);

        service
            .schedule(
                NotificationKind::Event,
                "Maulid Nabi".to_string(),
                "Besok adalah Maulid Nabi".to_string(),
                now - Duration::minutes(1),
                None,
                now - Duration::hours(1),
            )
            .await
            .unwrap();

        let sent = service.process_due_broadcasts(now).await.unwrap();

        assert_eq!(sent, 1);
        let calls = gateway.topic_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("EVENT".to_string(), "Maulid Nabi".to_string())]);
        // Single-shot: the record is gone, not flagged.
        assert!(schedules.rows().is_empty());
    }

    #[tokio::test]
    async fn broadcast_sweep_ignores_prayer_reminders() {
        let (schedules, gateway, service) = service();
        let now = at(12);

        schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "🌅 Waktu Fajr".to_string(),
                    body: "due prayer reminder".to_string(),
                    meta: None,
                    due_at: now - Duration::minutes(5),
                    device_id: Some(1),
                },
                now,
            )
            .await
            .unwrap();

        let sent = service.process_due_broadcasts(now).await.unwrap();

        assert_eq!(sent, 0);
        assert!(gateway.topic_calls.lock().unwrap().is_empty());
        assert_eq!(schedules.rows().len(), 1, "AZAN row untouched");
    }

    #[tokio::test]
    async fn future_broadcasts_are_left_alone() {
        let (schedules, _gateway, service) = service();
        let now = at(12);

        service
            .schedule(
                NotificationKind::General,
                "later".to_string(),
                "later".to_string(),
                now + Duration::hours(2),
                None,
                now,
            )
            .await
            .unwrap();

        assert_eq!(service.process_due_broadcasts(now).await.unwrap(), 0);
        assert_eq!(schedules.rows().len(), 1);
    }

    #[tokio::test]
    async fn failed_broadcast_stays_for_next_sweep() {
        let (schedules, gateway, service) = service();
        let now = at(12);

        service
            .schedule(
                NotificationKind::General,
                "retry me".to_string(),
                "retry me".to_string(),
                now - Duration::minutes(1),
                None,
                now - Duration::hours(1),
            )
            .await
            .unwrap();

        gateway.fail.store(true, Ordering::SeqCst);
        assert_eq!(service.process_due_broadcasts(now).await.unwrap(), 0);
        assert_eq!(schedules.rows().len(), 1, "record survives the failure");

        gateway.fail.store(false, Ordering::SeqCst);
        assert_eq!(service.process_due_broadcasts(now).await.unwrap(), 1);
        assert!(schedules.rows().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_schedule_is_not_found() {
        let (_schedules, _gateway, service) = service();
        let result = service.delete(42).await;
        assert!(matches!(
            result,
            Err(crate::client::FirebaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_upcoming_is_sorted_and_excludes_past() {
        let (_schedules, _gateway, service) = service();
        let now = at(12);

        service
            .schedule(
                NotificationKind::General,
                "second".to_string(),
                "b".to_string(),
                now + Duration::hours(4),
                None,
                now,
            )
            .await
            .unwrap();
        service
            .schedule(
                NotificationKind::Event,
                "first".to_string(),
                "a".to_string(),
                now + Duration::hours(1),
                None,
                now,
            )
            .await
            .unwrap();

        let upcoming = service.list_upcoming(now).await.unwrap();
        let titles: Vec<_> = upcoming.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
