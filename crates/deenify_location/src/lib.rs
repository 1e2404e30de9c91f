//! Reverse geocoding for Deenify
//!
//! LocationIQ lookups cached by coordinates rounded to six decimals.

#[cfg(feature = "openapi")]
pub mod doc;
pub mod handlers;
pub mod logic;
pub mod routes;

pub use logic::LocationService;
pub use routes::routes;
