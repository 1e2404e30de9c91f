// --- File: crates/services/deenify_backend/src/service_factory.rs ---
//! Construction of the external-service clients.
//!
//! Everything is built once here from configuration and injected into the
//! components that need it; the trait views exist so the scheduler and
//! tests can depend on the seams instead of the concrete clients.

use deenify_common::services::{
    BoxedError, NotificationGateway, PrayerTimesSource, ServiceFactory,
};
use deenify_config::{AppConfig, FirebaseConfig, PrayerConfig};
use deenify_firebase::client::FirebaseClient;
use deenify_firebase::FirebasePushGateway;
use deenify_prayer::provider::AladhanClient;
use std::sync::Arc;

/// Service factory for the Deenify backend.
///
/// Missing config sections fall back to empty defaults: the clients are
/// still constructed (the runtime `use_*` flags gate the features), and a
/// send without credentials surfaces a configuration error instead of a
/// boot failure.
pub struct DeenifyServiceFactory {
    gateway: Arc<FirebasePushGateway>,
    source: Arc<AladhanClient>,
}

impl DeenifyServiceFactory {
    pub fn new(config: &Arc<AppConfig>) -> Self {
        let firebase_config = config.firebase.clone().unwrap_or(FirebaseConfig {
            project_id: None,
            key_path: None,
            api_base_url: None,
        });
        let gateway = Arc::new(FirebasePushGateway::new(Arc::new(FirebaseClient::new(
            firebase_config,
        ))));

        let prayer_config = config.prayer.clone().unwrap_or(PrayerConfig {
            api_base_url: None,
            method: None,
        });
        let source = Arc::new(AladhanClient::new(&prayer_config));

        Self { gateway, source }
    }

    /// The concrete push gateway (the HTTP layer needs the concrete type
    /// for its state).
    pub fn push_gateway(&self) -> Arc<FirebasePushGateway> {
        self.gateway.clone()
    }
}

impl ServiceFactory for DeenifyServiceFactory {
    fn notification_gateway(&self) -> Option<Arc<dyn NotificationGateway<Error = BoxedError>>> {
        Some(self.gateway.clone())
    }

    fn prayer_times_source(&self) -> Option<Arc<dyn PrayerTimesSource<Error = BoxedError>>> {
        Some(self.source.clone())
    }
}
