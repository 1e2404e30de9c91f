//! Authentication module for Firebase Cloud Messaging
//!
//! Generates OAuth2 tokens from a service account key file for requests
//! against the FCM HTTP v1 API.

use deenify_config::FirebaseConfig;
use std::{error::Error, path::Path};
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};

/// Obtains an OAuth2 access token for Firebase Cloud Messaging.
///
/// Reads the service account key from the path in the FirebaseConfig and
/// requests a token with the FCM messaging scope.
///
/// # Errors
///
/// Fails if the key_path is missing, the key file cannot be read,
/// authentication fails, or no token is returned.
pub async fn get_firebase_auth_token(
    config: &FirebaseConfig,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let key_path = config
        .key_path
        .as_deref()
        .ok_or("Missing key_path in FirebaseConfig")?;

    let sa_key = read_service_account_key(Path::new(key_path)).await?;

    // FCM requires the "https://www.googleapis.com/auth/firebase.messaging" scope
    let auth = ServiceAccountAuthenticator::builder(sa_key).build().await?;

    let auth_token = auth
        .token(&["https://www.googleapis.com/auth/firebase.messaging"])
        .await?;
    let fcm_result_token = match auth_token.token() {
        Some(token) => token,
        None => {
            return Err("No token available".into());
        }
    };

    Ok(fcm_result_token.to_string())
}
