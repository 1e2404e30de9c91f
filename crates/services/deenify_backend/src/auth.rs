// --- File: crates/services/deenify_backend/src/auth.rs ---

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;
use deenify_config::AppConfig;
use std::sync::Arc;
use tracing::{error, warn};

// The state this auth middleware has access to: the AppConfig, for the
// expected API key.
#[derive(Clone)]
pub struct ApiKeyAuthState {
    pub config: Arc<AppConfig>,
}

const API_KEY_HEADER: &str = "X-Api-Key";

/// Axum middleware authenticating mobile-client requests.
/// Checks for the shared API key in the `X-Api-Key` header.
pub async fn api_key_middleware(
    State(auth_state): State<Arc<ApiKeyAuthState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // 1. The expected key from config (DEENIFY_AUTH__API_KEY in env)
    let expected_key = match auth_state
        .config
        .auth
        .as_ref()
        .and_then(|auth| auth.api_key.clone())
    {
        Some(key) => key,
        None => {
            error!("API key not configured in AppConfig");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error for API auth.".to_string(),
            )
                .into_response();
        }
    };

    // 2. The key the client provided
    let provided_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    // 3. Validate with a constant-time comparison
    match provided_key {
        Some(provided) => {
            if constant_time_eq(provided.as_bytes(), expected_key.as_bytes()) {
                next.run(req).await
            } else {
                warn!("Request with invalid API key");
                (
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized: Invalid credentials.".to_string(),
                )
                    .into_response()
            }
        }
        None => (
            StatusCode::UNAUTHORIZED,
            format!("Unauthorized: Missing {} header.", API_KEY_HEADER),
        )
            .into_response(),
    }
}
