#[cfg(test)]
mod tests {
    use crate::provider::CachedPrayerTimes;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use chrono_tz::Asia::Jakarta;
    use deenify_common::models::PrayerTimesSnapshot;
    use deenify_common::services::{BoxFuture, BoxedError, PrayerTimesSource, PrayerTimings};
    use deenify_db::{DbError, PrayerCacheRepository};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

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

    struct CountingSource {
        fetches: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    impl PrayerTimesSource for CountingSource {
        type Error = BoxedError;

        fn fetch_timings(
            &self,
            _date: NaiveDate,
            latitude: f64,
            _longitude: f64,
        ) -> BoxFuture<'_, PrayerTimings, Self::Error> {
            Box::pin(async move {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                if self.fail.load(Ordering::SeqCst) {
                    return Err(BoxedError("source unreachable".into()));
                }
                // Encode the latitude into the response so a test can tell
                // which coordinates produced a snapshot.
                Ok(PrayerTimings {
                    fajr: format!("04:{:02}", (latitude.abs() as u32) % 60),
                    dhuhr: "12:00".to_string(),
                    asr: "15:15".to_string(),
                    maghrib: "18:05".to_string(),
                    isha: "19:20".to_string(),
                })
            })
        }
    }

    fn provider() -> (Arc<CountingSource>, CachedPrayerTimes<InMemoryPrayerCache>) {
        let source = Arc::new(CountingSource::new());
        let cache = Arc::new(InMemoryPrayerCache::default());
        let provider = CachedPrayerTimes::new(
            cache,
            source.clone() as Arc<dyn PrayerTimesSource<Error = BoxedError>>,
        );
        (source, provider)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Jakarta
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn second_lookup_same_date_hits_the_cache() {
        let (source, provider) = provider();
        let now = at(2025, 3, 10, 6);

        let first = provider.get_today(-6.2, 106.8, now).await.unwrap();
        let second = provider.get_today(-6.2, 106.8, now).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_is_date_keyed_not_location_keyed() {
        // A known simplification: all callers on the same date share one
        // snapshot regardless of coordinates.
        let (source, provider) = provider();
        let now = at(2025, 3, 10, 6);

        let jakarta = provider.get_today(-6.2, 106.8, now).await.unwrap();
        let elsewhere = provider.get_today(52.5, 13.4, now).await.unwrap();

        assert_eq!(jakarta, elsewhere);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_date_triggers_exactly_one_fetch() {
        let (source, provider) = provider();

        provider.get_today(-6.2, 106.8, at(2025, 3, 10, 6)).await.unwrap();
        provider.get_today(-6.2, 106.8, at(2025, 3, 11, 6)).await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn source_failure_propagates_without_stale_fallback() {
        let (source, provider) = provider();
        source.fail.store(true, Ordering::SeqCst);

        let result = provider.get_today(-6.2, 106.8, at(2025, 3, 10, 6)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn purge_drops_only_past_dates() {
        let (_source, provider) = provider();

        provider.get_today(-6.2, 106.8, at(2025, 3, 10, 6)).await.unwrap();
        provider.get_today(-6.2, 106.8, at(2025, 3, 11, 6)).await.unwrap();

        let removed = provider.clean_old_cache(at(2025, 3, 11, 7)).await.unwrap();
        assert_eq!(removed, 1);

        // Today's snapshot survives the purge.
        let today = provider.get_today(-6.2, 106.8, at(2025, 3, 11, 8)).await.unwrap();
        assert_eq!(today.date, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
    }
}
