// --- File: crates/services/deenify_backend/src/app_state.rs ---
//! Application state shared across routes and periodic tasks.
//!
//! Every repository and service is constructed exactly once here and
//! handed out as an `Arc`; nothing in the application is a process-wide
//! singleton, which is what keeps the scheduler testable with substitute
//! collaborators.

use crate::service_factory::DeenifyServiceFactory;
use deenify_common::services::ServiceFactory;
use deenify_config::AppConfig;
use deenify_db::{
    DbClient, DbError, DeviceRepository, IslamicEventRepository, LocationCacheRepository,
    NotificationScheduleRepository, PrayerCacheRepository, QuranRepository, SqlDeviceRepository,
    SqlIslamicEventRepository, SqlLocationCacheRepository, SqlNotificationScheduleRepository,
    SqlPrayerCacheRepository, SqlQuranRepository,
};
use deenify_firebase::{FirebasePushGateway, NotificationScheduleService};
use deenify_location::LocationService;
use deenify_prayer::provider::CachedPrayerTimes;
use deenify_prayer::{PrayerNotificationScheduler, SqlPrayerNotificationScheduler};
use deenify_quran::QuranService;
use std::sync::Arc;
use tracing::warn;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,

    /// Kept so the trait views stay reachable for anything that wants to
    /// depend on the seams rather than the concrete services.
    #[allow(dead_code)]
    pub service_factory: Arc<DeenifyServiceFactory>,

    pub db_client: DbClient,

    pub devices: Arc<SqlDeviceRepository>,
    pub schedules: Arc<SqlNotificationScheduleRepository>,
    pub events: Arc<SqlIslamicEventRepository>,

    pub gateway: Arc<FirebasePushGateway>,
    pub prayer_times: Arc<CachedPrayerTimes<SqlPrayerCacheRepository>>,
    pub scheduler: Arc<SqlPrayerNotificationScheduler>,
    pub notifications: Arc<NotificationScheduleService<SqlNotificationScheduleRepository>>,
    pub quran: Arc<QuranService<SqlQuranRepository>>,

    /// None when the location feature is off or its API key is missing.
    pub location: Option<Arc<LocationService<SqlLocationCacheRepository>>>,
}

impl AppState {
    /// Connect to the store, initialize every schema, and wire the
    /// services together.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, DbError> {
        let db_client = DbClient::new(&config).await?;

        let devices = Arc::new(SqlDeviceRepository::new(db_client.clone()));
        let schedules = Arc::new(SqlNotificationScheduleRepository::new(db_client.clone()));
        let prayer_cache = Arc::new(SqlPrayerCacheRepository::new(db_client.clone()));
        let location_cache = Arc::new(SqlLocationCacheRepository::new(db_client.clone()));
        let events = Arc::new(SqlIslamicEventRepository::new(db_client.clone()));
        let quran_repo = Arc::new(SqlQuranRepository::new(db_client.clone()));

        devices.init_schema().await?;
        schedules.init_schema().await?;
        prayer_cache.init_schema().await?;
        location_cache.init_schema().await?;
        events.init_schema().await?;
        quran_repo.init_schema().await?;

        let service_factory = Arc::new(DeenifyServiceFactory::new(&config));
        let gateway = service_factory.push_gateway();
        let source = service_factory
            .prayer_times_source()
            .expect("prayer times source is always constructed");

        let prayer_times = Arc::new(CachedPrayerTimes::new(prayer_cache, source));

        let scheduler: Arc<SqlPrayerNotificationScheduler> =
            Arc::new(PrayerNotificationScheduler::new(
                devices.clone(),
                schedules.clone(),
                prayer_times.clone(),
                service_factory
                    .notification_gateway()
                    .expect("notification gateway is always constructed"),
            ));

        let notifications = Arc::new(NotificationScheduleService::new(
            schedules.clone(),
            service_factory
                .notification_gateway()
                .expect("notification gateway is always constructed"),
        ));

        let quran = Arc::new(QuranService::new(quran_repo, config.quran.as_ref()));

        let location = if config.use_location {
            match LocationService::new(location_cache, config.location.as_ref()) {
                Ok(service) => Some(Arc::new(service)),
                Err(e) => {
                    warn!("Location service disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            config,
            service_factory,
            db_client,
            devices,
            schedules,
            events,
            gateway,
            prayer_times,
            scheduler,
            notifications,
            quran,
            location,
        })
    }
}
