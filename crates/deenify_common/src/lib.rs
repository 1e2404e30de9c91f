//! Shared building blocks for the Deenify backend.
//!
//! This crate holds the pieces every feature crate leans on: the common
//! error type with its HTTP status mapping, logging initialization, the
//! shared domain models, and the service traits used for dependency
//! injection at the seams to external collaborators (push gateway,
//! prayer times source).

pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod services;

pub use error::{DeenifyError, HttpStatusCode};
