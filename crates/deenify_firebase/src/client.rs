//! Firebase Cloud Messaging client module
//!
//! Client for the FCM HTTP v1 API: sends push notifications to a single
//! device by registration token or to a topic devices subscribe to.

use crate::auth::get_firebase_auth_token;
use deenify_config::FirebaseConfig;
use deenify_db::DbError;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE: &str = "https://fcm.googleapis.com/v1";

/// Outbound requests must not hang a sweep; FCM answers well within this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when interacting with the Firebase Cloud Messaging API
#[derive(Error, Debug)]
pub enum FirebaseError {
    /// Error during authentication with Firebase
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error during HTTP request to Firebase API
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Missing required configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// Error returned by the Firebase API
    #[error("Firebase API error: {0}")]
    ApiError(String),

    /// Error from the schedule store
    #[error("Database error: {0}")]
    DbError(#[from] DbError),

    /// A record that was expected to exist was not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// A message to be sent via Firebase Cloud Messaging.
///
/// Top-level wrapper required by the FCM HTTP v1 API format.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FcmMessage {
    /// The message payload
    pub message: Message,
}

/// The message payload for Firebase Cloud Messaging.
///
/// Exactly one of `token` or `topic` must be set.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Message {
    /// Registration token of the target device (single device targeting)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Topic the target devices are subscribed to (topic messaging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// The notification displayed on the device; None for data-only
    /// messages
    pub notification: Option<Notification>,

    /// Custom key-value data delivered to the client app
    pub data: Option<std::collections::HashMap<String, String>>,
}

/// The notification displayed on the user's device.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Notification {
    /// The title of the notification
    pub title: String,

    /// The body text of the notification
    pub body: String,
}

/// Response from the Firebase Cloud Messaging API.
#[derive(Debug, Deserialize)]
pub struct FcmResponse {
    /// Message ID in the format "projects/{project_id}/messages/{message_id}"
    pub name: String,
}

/// Client for the Firebase Cloud Messaging API.
///
/// Handles authentication and the send call. The API base URL is
/// configurable so tests can point it at a local server.
pub struct FirebaseClient {
    /// HTTP client for requests to the FCM API
    client: Client,

    /// Firebase configuration: project ID and service account key path
    config: FirebaseConfig,
}

impl FirebaseClient {
    /// Creates a new Firebase client with the given configuration.
    pub fn new(config: FirebaseConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    fn api_base(&self) -> &str {
        self.config.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Sends a push notification message via Firebase Cloud Messaging.
    ///
    /// # Errors
    ///
    /// Fails if the project_id is missing, authentication fails, the
    /// request fails, or the API returns a non-success status.
    pub async fn send_message(&self, message: FcmMessage) -> Result<String, FirebaseError> {
        let project_id = self.config.project_id.as_deref().ok_or_else(|| {
            FirebaseError::ConfigError("Missing project_id in FirebaseConfig".to_string())
        })?;

        let url = format!("{}/projects/{}/messages:send", self.api_base(), project_id);

        let token = get_firebase_auth_token(&self.config)
            .await
            .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(FirebaseError::ApiError(error_text));
        }

        let fcm_response: FcmResponse = response.json().await?;
        Ok(fcm_response.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_token_xor_topic() {
        let message = FcmMessage {
            message: Message {
                token: Some("device-token".to_string()),
                topic: None,
                notification: Some(Notification {
                    title: "Hello".to_string(),
                    body: "World".to_string(),
                }),
                data: None,
            },
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["message"]["token"], "device-token");
        // Unset target must be absent, not null: FCM rejects both set.
        assert!(value["message"].get("topic").is_none());
        assert_eq!(value["message"]["notification"]["title"], "Hello");
    }

    #[test]
    fn data_payload_round_trips_as_string_map() {
        let mut data = std::collections::HashMap::new();
        data.insert("count".to_string(), "3".to_string());

        let message = FcmMessage {
            message: Message {
                token: None,
                topic: Some("EVENT".to_string()),
                notification: None,
                data: Some(data),
            },
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["message"]["topic"], "EVENT");
        assert_eq!(value["message"]["data"]["count"], "3");
    }
}
