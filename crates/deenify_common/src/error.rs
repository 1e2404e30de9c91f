// --- File: crates/deenify_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all Deenify errors.
///
/// This enum provides a common set of error variants that can be used across all crates.
/// Each crate can extend this by implementing From<SpecificError> for DeenifyError.
#[derive(Error, Debug)]
pub enum DeenifyError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for DeenifyError {
    fn status_code(&self) -> u16 {
        match self {
            DeenifyError::HttpError(_) => 500,
            DeenifyError::ParseError(_) => 400,
            DeenifyError::ConfigError(_) => 500,
            DeenifyError::AuthError(_) => 401,
            DeenifyError::ValidationError(_) => 400,
            DeenifyError::DatabaseError(_) => 500,
            DeenifyError::ExternalServiceError { .. } => 502,
            DeenifyError::NotFoundError(_) => 404,
            DeenifyError::TimeoutError(_) => 504,
            DeenifyError::InternalError(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for DeenifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeenifyError::TimeoutError(err.to_string())
        } else {
            DeenifyError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DeenifyError {
    fn from(err: serde_json::Error) -> Self {
        DeenifyError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for DeenifyError {
    fn from(err: std::io::Error) -> Self {
        DeenifyError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> DeenifyError {
    DeenifyError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> DeenifyError {
    DeenifyError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> DeenifyError {
    DeenifyError::NotFoundError(message.to_string())
}

pub fn database_error<T: fmt::Display>(message: T) -> DeenifyError {
    DeenifyError::DatabaseError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> DeenifyError {
    DeenifyError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> DeenifyError {
    DeenifyError::InternalError(message.to_string())
}
