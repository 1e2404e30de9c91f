#[cfg(test)]
mod tests {
    use crate::provider::CachedPrayerTimes;
    use crate::scheduler::PrayerNotificationScheduler;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use chrono_tz::Asia::Jakarta;
    use deenify_common::models::{
        Device, EnabledPrayers, NotificationKind, PrayerTimesSnapshot, ScheduledNotification,
    };
    use deenify_common::services::{
        BoxFuture, BoxedError, NotificationGateway, NotificationResult, PrayerTimesSource,
        PrayerTimings,
    };
    use deenify_db::{
        DbError, DevicePreferencesUpdate, DeviceRepository, DueReminder, NewDevice,
        NewScheduledNotification, NotificationScheduleRepository, PrayerCacheRepository,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // --- In-memory fakes -------------------------------------------------

    #[derive(Default)]
    struct InMemoryDevices {
        devices: Mutex<Vec<Device>>,
    }

    impl DeviceRepository for InMemoryDevices {
        async fn init_schema(&self) -> Result<(), DbError> {
            Ok(())
        }

        async fn register(&self, device: NewDevice, now: DateTime<Utc>) -> Result<Device, DbError> {
            let mut devices = self.devices.lock().unwrap();
            let id = devices.len() as i64 + 1;
            let created = Device {
                id: Some(id),
                token: device.token,
                device_id: device.device_id,
                platform: device.platform,
                latitude: device.latitude,
                longitude: device.longitude,
                timezone: device.timezone,
                enable_prayer_notifications: true,
                enable_event_notifications: true,
                notify_before_prayer: 5,
                enabled_prayers: None,
                last_active_at: Some(now),
                created_at: Some(now),
            };
            devices.push(created.clone());
            Ok(created)
        }

        async fn update_preferences(
            &self,
            token: &str,
            _update: DevicePreferencesUpdate,
            _now: DateTime<Utc>,
        ) -> Result<Device, DbError> {
            Err(DbError::NotFound(token.to_string()))
        }

        async fn find_by_token(&self, token: &str) -> Result<Option<Device>, DbError> {
            Ok(self
                .devices
                .lock()
                .unwrap()
                .iter()
                .find(|d| d.token == token)
                .cloned())
        }

        async fn find_eligible(&self) -> Result<Vec<Device>, DbError> {
            Ok(self
                .devices
                .lock()
                .unwrap()
                .iter()
                .filter(|d| d.enable_prayer_notifications && d.has_coordinates())
                .cloned()
                .collect())
        }

        async fn delete_by_token(&self, token: &str) -> Result<bool, DbError> {
            let mut devices = self.devices.lock().unwrap();
            let before = devices.len();
            devices.retain(|d| d.token != token);
            Ok(devices.len() < before)
        }

        async fn delete_inactive_since(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
            let mut devices = self.devices.lock().unwrap();
            let before = devices.len();
            devices.retain(|d| d.last_active_at.map(|at| at >= cutoff).unwrap_or(true));
            Ok((before - devices.len()) as u64)
        }
    }

    #[derive(Default)]
    struct InMemorySchedules {
        rows: Mutex<Vec<ScheduledNotification>>,
        next_id: Mutex<i64>,
        device_tokens: Mutex<HashMap<i64, String>>,
    }

    impl InMemorySchedules {
        fn set_token(&self, device_id: i64, token: &str) {
            self.device_tokens
                .lock()
                .unwrap()
                .insert(device_id, token.to_string());
        }

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
            let tokens = self.device_tokens.lock().unwrap().clone();
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.kind == NotificationKind::Azan && n.due_at <= now && !n.sent)
                .map(|n| DueReminder {
                    notification: n.clone(),
                    device_token: n.device_id.and_then(|id| tokens.get(&id).cloned()),
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

        async fn delete_pending_reminders_for_device(&self, device_id: i64) -> Result<u64, DbError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|n| {
                !(n.device_id == Some(device_id) && n.kind == NotificationKind::Azan && !n.sent)
            });
            Ok((before - rows.len()) as u64)
        }

        async fn delete_sent_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|n| !(n.sent && n.sent_at.map(|at| at < cutoff).unwrap_or(false)));
            Ok((before - rows.len()) as u64)
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
    struct InMemoryPrayerCache {
        snapshots: Mutex<HashMap<NaiveDate, PrayerTimesSnapshot>>,
    }

    impl PrayerCacheRepository for InMemoryPrayerCache {
        async fn init_schema(&self) -> Result<(), DbError> {
            Ok(())
        }

        async fn find_by_date(
            &self,
            date: NaiveDate,
        ) -> Result<Option<PrayerTimesSnapshot>, DbError> {
            Ok(self.snapshots.lock().unwrap().get(&date).cloned())
        }

        async fn insert(
            &self,
            snapshot: &PrayerTimesSnapshot,
            _now: DateTime<Utc>,
        ) -> Result<(), DbError> {
            self.snapshots
                .lock()
                .unwrap()
                .insert(snapshot.date, snapshot.clone());
            Ok(())
        }

        async fn delete_before(&self, date: NaiveDate) -> Result<u64, DbError> {
            let mut snapshots = self.snapshots.lock().unwrap();
            let before = snapshots.len();
            snapshots.retain(|d, _| *d >= date);
            Ok((before - snapshots.len()) as u64)
        }
    }

    struct FakeSource {
        timings: PrayerTimings,
        fetches: AtomicUsize,
        fail_next: AtomicBool,
    }

    impl FakeSource {
        fn new(times: [&str; 5]) -> Self {
            Self {
                timings: PrayerTimings {
                    fajr: times[0].to_string(),
                    dhuhr: times[1].to_string(),
                    asr: times[2].to_string(),
                    maghrib: times[3].to_string(),
                    isha: times[4].to_string(),
                },
                fetches: AtomicUsize::new(0),
                fail_next: AtomicBool::new(false),
            }
        }
    }

    impl PrayerTimesSource for FakeSource {
        type Error = BoxedError;

        fn fetch_timings(
            &self,
            _date: NaiveDate,
            _latitude: f64,
            _longitude: f64,
        ) -> BoxFuture<'_, PrayerTimings, Self::Error> {
            Box::pin(async move {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                if self.fail_next.swap(false, Ordering::SeqCst) {
                    return Err(BoxedError("source unreachable".into()));
                }
                Ok(self.timings.clone())
            })
        }
    }

    #[derive(Default)]
    struct FakeGateway {
        device_calls: Mutex<Vec<(String, String)>>,
        fail: AtomicBool,
    }

    impl NotificationGateway for FakeGateway {
        type Error = BoxedError;

        fn send_to_device(
            &self,
            token: &str,
            title: &str,
            _body: &str,
            _meta: Option<&serde_json::Value>,
        ) -> BoxFuture<'_, NotificationResult, Self::Error> {
            let token = token.to_string();
            let title = title.to_string();
            Box::pin(async move {
                if self.fail.load(Ordering::SeqCst) {
                    return Err(BoxedError("gateway down".into()));
                }
                self.device_calls.lock().unwrap().push((token, title));
                Ok(NotificationResult {
                    id: "fake-message".to_string(),
                    status: "sent".to_string(),
                })
            })
        }

        fn send_to_topic(
            &self,
            _topic: &str,
            _title: &str,
            _body: &str,
            _meta: Option<&serde_json::Value>,
        ) -> BoxFuture<'_, NotificationResult, Self::Error> {
            Box::pin(async move {
                Ok(NotificationResult {
                    id: "fake-topic-message".to_string(),
                    status: "sent".to_string(),
                })
            })
        }
    }

    // --- Test fixture ----------------------------------------------------

    struct Fixture {
        devices: Arc<InMemoryDevices>,
        schedules: Arc<InMemorySchedules>,
        source: Arc<FakeSource>,
        gateway: Arc<FakeGateway>,
        scheduler:
            PrayerNotificationScheduler<InMemoryDevices, InMemorySchedules, InMemoryPrayerCache>,
    }

    fn fixture(times: [&str; 5]) -> Fixture {
        let devices = Arc::new(InMemoryDevices::default());
        let schedules = Arc::new(InMemorySchedules::default());
        let cache = Arc::new(InMemoryPrayerCache::default());
        let source = Arc::new(FakeSource::new(times));
        let gateway = Arc::new(FakeGateway::default());

        let provider = Arc::new(CachedPrayerTimes::new(
            cache,
            source.clone() as Arc<dyn PrayerTimesSource<Error = BoxedError>>,
        ));

        let scheduler = PrayerNotificationScheduler::new(
            devices.clone(),
            schedules.clone(),
            provider,
            gateway.clone() as Arc<dyn NotificationGateway<Error = BoxedError>>,
        );

        Fixture {
            devices,
            schedules,
            source,
            gateway,
            scheduler,
        }
    }

    fn local(h: u32, min: u32) -> DateTime<Utc> {
        Jakarta
            .with_ymd_and_hms(2025, 3, 10, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn register_device(fx: &Fixture, token: &str, now: DateTime<Utc>) -> Device {
        let device = fx
            .devices
            .register(
                NewDevice {
                    token: token.to_string(),
                    device_id: None,
                    platform: Some("android".to_string()),
                    latitude: Some(-6.2),
                    longitude: Some(106.8),
                    timezone: Some("Asia/Jakarta".to_string()),
                },
                now,
            )
            .await
            .unwrap();
        fx.schedules.set_token(device.id.unwrap(), token);
        device
    }

    // --- Computation -----------------------------------------------------

    #[tokio::test]
    async fn schedules_single_future_prayer() {
        // Scenario A: only Fajr (05:10) is still ahead just before 05:00
        // with a 10 minute lead; the candidate instant must be strictly
        // in the future.
        let fx = fixture(["05:10", "04:00", "04:00", "04:00", "04:00"]);
        let now = local(4, 59);

        let mut device = register_device(&fx, "token-a", now).await;
        device.notify_before_prayer = 10;

        let scheduled = fx.scheduler.schedule_for_device(&device, now).await.unwrap();

        assert_eq!(scheduled, 1);
        let rows = fx.schedules.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, NotificationKind::Azan);
        assert_eq!(rows[0].due_at, local(5, 0));
        assert!(rows[0].title.contains("Fajr"));
        assert_eq!(rows[0].device_id, device.id);
        assert!(!rows[0].sent);
    }

    #[tokio::test]
    async fn disabled_prayer_is_never_scheduled() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(5, 0);

        let mut device = register_device(&fx, "token-c", now).await;
        device.enabled_prayers = Some(EnabledPrayers {
            asr: Some(false),
            ..Default::default()
        });

        let scheduled = fx.scheduler.schedule_for_device(&device, now).await.unwrap();

        assert_eq!(scheduled, 4);
        assert!(fx
            .schedules
            .rows()
            .iter()
            .all(|r| !r.title.contains("Asr")));
    }

    #[tokio::test]
    async fn device_without_coordinates_is_rejected() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(5, 0);

        let mut device = register_device(&fx, "token-x", now).await;
        device.longitude = None;

        let result = fx.scheduler.schedule_for_device(&device, now).await;
        assert!(result.is_err());
        assert!(fx.schedules.rows().is_empty());
    }

    #[tokio::test]
    async fn recompute_replaces_pending_rows_instead_of_duplicating() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(5, 0);

        let device = register_device(&fx, "token-r", now).await;

        fx.scheduler.schedule_for_device(&device, now).await.unwrap();
        fx.scheduler.schedule_for_device(&device, now).await.unwrap();

        // Delete-then-reinsert: a second compute must not stack a second
        // set of pending rows.
        assert_eq!(fx.schedules.rows().len(), 5);
    }

    #[tokio::test]
    async fn recompute_never_touches_sent_rows() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(5, 0);

        let device = register_device(&fx, "token-s", now).await;

        // A reminder already delivered earlier today.
        let delivered = fx
            .schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "🌅 Waktu Fajr".to_string(),
                    body: "sent earlier".to_string(),
                    meta: None,
                    due_at: local(4, 30),
                    device_id: device.id,
                },
                now,
            )
            .await
            .unwrap();
        fx.schedules.mark_sent(delivered.id.unwrap(), now).await.unwrap();

        fx.scheduler.schedule_for_device(&device, now).await.unwrap();

        let rows = fx.schedules.rows();
        assert_eq!(rows.len(), 6, "5 fresh rows plus the delivered one");
        assert!(rows.iter().any(|r| r.id == delivered.id && r.sent));
    }

    #[tokio::test]
    async fn bulk_compute_isolates_per_device_failures() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(5, 0);

        register_device(&fx, "token-1", now).await;
        register_device(&fx, "token-2", now).await;

        // First provider fetch fails; the first device gets nothing, the
        // second still schedules (and warms the cache).
        fx.source.fail_next.store(true, Ordering::SeqCst);

        let outcome = fx.scheduler.schedule_daily(now).await.unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.failed_devices(), 1);
        assert!(outcome.results[0].error.is_some());
        assert_eq!(outcome.results[0].scheduled, 0);
        assert_eq!(outcome.results[1].scheduled, 5);
        assert_eq!(outcome.total_scheduled(), 5);
    }

    #[tokio::test]
    async fn bulk_compute_only_sees_eligible_devices() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(5, 0);

        register_device(&fx, "with-coords", now).await;
        fx.devices
            .register(
                NewDevice {
                    token: "no-coords".to_string(),
                    device_id: None,
                    platform: None,
                    latitude: None,
                    longitude: None,
                    timezone: None,
                },
                now,
            )
            .await
            .unwrap();

        let outcome = fx.scheduler.schedule_daily(now).await.unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].token, "with-coords");
    }

    // --- Sweep -----------------------------------------------------------

    #[tokio::test]
    async fn sweep_dispatches_due_and_only_due() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(12, 0);

        let device = register_device(&fx, "token-d", now).await;

        // One due, one future, one already sent.
        fx.schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "due".to_string(),
                    body: "due".to_string(),
                    meta: None,
                    due_at: local(11, 55),
                    device_id: device.id,
                },
                now,
            )
            .await
            .unwrap();
        fx.schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "future".to_string(),
                    body: "future".to_string(),
                    meta: None,
                    due_at: local(18, 0),
                    device_id: device.id,
                },
                now,
            )
            .await
            .unwrap();
        let sent_row = fx
            .schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "already sent".to_string(),
                    body: "sent".to_string(),
                    meta: None,
                    due_at: local(11, 0),
                    device_id: device.id,
                },
                now,
            )
            .await
            .unwrap();
        fx.schedules.mark_sent(sent_row.id.unwrap(), now).await.unwrap();

        let sent = fx.scheduler.process_due_reminders(now).await.unwrap();

        assert_eq!(sent, 1);
        let calls = fx.gateway.device_calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "due");

        let rows = fx.schedules.rows();
        let due_row = rows.iter().find(|r| r.title == "due").unwrap();
        assert!(due_row.sent);
        assert_eq!(due_row.sent_at, Some(now));
        assert!(!rows.iter().find(|r| r.title == "future").unwrap().sent);
    }

    #[tokio::test]
    async fn second_sweep_never_double_sends() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(12, 0);

        let device = register_device(&fx, "token-e", now).await;
        fx.schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "due".to_string(),
                    body: "due".to_string(),
                    meta: None,
                    due_at: local(11, 55),
                    device_id: device.id,
                },
                now,
            )
            .await
            .unwrap();

        assert_eq!(fx.scheduler.process_due_reminders(now).await.unwrap(), 1);
        assert_eq!(fx.scheduler.process_due_reminders(now).await.unwrap(), 0);
        assert_eq!(fx.gateway.device_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_sweep_is_a_no_op() {
        // Scenario D: nothing due, no gateway calls, no store writes.
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(12, 0);

        assert_eq!(fx.scheduler.process_due_reminders(now).await.unwrap(), 0);
        assert!(fx.gateway.device_calls.lock().unwrap().is_empty());
        assert!(fx.schedules.rows().is_empty());
    }

    #[tokio::test]
    async fn failed_dispatch_leaves_record_due_for_retry() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(12, 0);

        let device = register_device(&fx, "token-f", now).await;
        fx.schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "due".to_string(),
                    body: "due".to_string(),
                    meta: None,
                    due_at: local(11, 55),
                    device_id: device.id,
                },
                now,
            )
            .await
            .unwrap();

        fx.gateway.fail.store(true, Ordering::SeqCst);
        assert_eq!(fx.scheduler.process_due_reminders(now).await.unwrap(), 0);
        assert!(!fx.schedules.rows()[0].sent, "record stays due");

        // Gateway recovers; the next sweep delivers it.
        fx.gateway.fail.store(false, Ordering::SeqCst);
        assert_eq!(fx.scheduler.process_due_reminders(now).await.unwrap(), 1);
        assert!(fx.schedules.rows()[0].sent);
    }

    #[tokio::test]
    async fn reminder_without_device_token_is_skipped() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(12, 0);

        // Device id 99 has no token registered in the store.
        fx.schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "orphan".to_string(),
                    body: "orphan".to_string(),
                    meta: None,
                    due_at: local(11, 55),
                    device_id: Some(99),
                },
                now,
            )
            .await
            .unwrap();

        assert_eq!(fx.scheduler.process_due_reminders(now).await.unwrap(), 0);
        assert!(fx.gateway.device_calls.lock().unwrap().is_empty());
    }

    // --- Retention -------------------------------------------------------

    #[tokio::test]
    async fn retention_purges_only_old_sent_rows() {
        let fx = fixture(["23:00", "23:00", "23:00", "23:00", "23:00"]);
        let now = local(12, 0);

        let device = register_device(&fx, "token-g", now).await;

        let old = fx
            .schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "old".to_string(),
                    body: "old".to_string(),
                    meta: None,
                    due_at: now - chrono::Duration::days(10),
                    device_id: device.id,
                },
                now,
            )
            .await
            .unwrap();
        fx.schedules
            .mark_sent(old.id.unwrap(), now - chrono::Duration::days(8))
            .await
            .unwrap();

        let recent = fx
            .schedules
            .create(
                NewScheduledNotification {
                    kind: NotificationKind::Azan,
                    title: "recent".to_string(),
                    body: "recent".to_string(),
                    meta: None,
                    due_at: now - chrono::Duration::hours(2),
                    device_id: device.id,
                },
                now,
            )
            .await
            .unwrap();
        fx.schedules.mark_sent(recent.id.unwrap(), now).await.unwrap();

        let removed = fx.scheduler.clean_old_reminders(now).await.unwrap();

        assert_eq!(removed, 1);
        let rows = fx.schedules.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "recent");
    }
}
