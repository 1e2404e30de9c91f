//! Islamic calendar events for Deenify

#[cfg(feature = "openapi")]
pub mod doc;
pub mod handlers;
pub mod routes;

pub use routes::routes;
