// --- File: crates/deenify_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! This module provides trait definitions for the external services the
//! application depends on: the push notification gateway and the prayer
//! times source. These traits allow for dependency injection and easier
//! testing by decoupling the scheduling logic from specific
//! implementations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// A trait for push notification gateway operations.
///
/// Messages are either addressed to a single device by its push token or
/// fanned out to every device subscribed to a topic. Metadata values must
/// be coerced to text before transmission; implementations own that
/// coercion so callers can pass structured JSON.
pub trait NotificationGateway: Send + Sync {
    /// Error type returned by gateway operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a titled message to one device token.
    fn send_to_device(
        &self,
        token: &str,
        title: &str,
        body: &str,
        meta: Option<&serde_json::Value>,
    ) -> BoxFuture<'_, NotificationResult, Self::Error>;

    /// Send a titled message to a broadcast topic.
    fn send_to_topic(
        &self,
        topic: &str,
        title: &str,
        body: &str,
        meta: Option<&serde_json::Value>,
    ) -> BoxFuture<'_, NotificationResult, Self::Error>;
}

/// A trait for fetching daily prayer timings from an external source.
pub trait PrayerTimesSource: Send + Sync {
    /// Error type returned by timing lookups.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the five prayer clock-times ("HH:MM", local) for the given
    /// date and coordinates.
    fn fetch_timings(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> BoxFuture<'_, PrayerTimings, Self::Error>;
}

/// A factory for creating service instances.
///
/// Services are constructed once at startup from configuration and handed
/// to the components that need them; nothing here is a process-wide
/// singleton.
pub trait ServiceFactory: Send + Sync {
    /// Get the push notification gateway, if configured.
    fn notification_gateway(&self) -> Option<Arc<dyn NotificationGateway<Error = BoxedError>>>;

    /// Get the prayer times source, if configured.
    fn prayer_times_source(&self) -> Option<Arc<dyn PrayerTimesSource<Error = BoxedError>>>;
}

/// Represents the result of a notification dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NotificationResult {
    /// The gateway-assigned message ID.
    pub id: String,
    /// The status of the dispatch.
    pub status: String,
}

/// The five daily prayer clock-times as returned by a timings source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrayerTimings {
    pub fajr: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}
