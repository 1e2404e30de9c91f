//! Firebase Cloud Messaging integration for Deenify
//!
//! This crate provides the push side of the system:
//!
//! - Authentication with Firebase using service account credentials
//! - Sending push notifications to device tokens and to topics
//! - The [`NotificationGateway`](deenify_common::services::NotificationGateway)
//!   implementation the prayer scheduler dispatches through
//! - The device registry HTTP endpoints (register, preferences, info,
//!   unregister, test notification)
//! - Ad-hoc and scheduled broadcast notifications, with the due sweep
//!   that fans them out to their topics

pub mod auth;
pub mod client;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod gateway;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_test;
pub mod routes;

// Re-export the routes function to be used by the main backend service
pub use routes::routes;
pub use gateway::FirebasePushGateway;
pub use logic::NotificationScheduleService;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::FirebaseApiDoc;
}
