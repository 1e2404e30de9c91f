//! NotificationGateway implementation backed by Firebase Cloud Messaging
//!
//! Adapts [`FirebaseClient`] to the gateway trait the scheduler depends
//! on, including the metadata stringification FCM requires.

use crate::client::{FcmMessage, FirebaseClient, Message, Notification};
use deenify_common::services::{BoxFuture, BoxedError, NotificationGateway, NotificationResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Push gateway over FCM.
pub struct FirebasePushGateway {
    client: Arc<FirebaseClient>,
}

impl FirebasePushGateway {
    pub fn new(client: Arc<FirebaseClient>) -> Self {
        Self { client }
    }
}

/// FCM data payloads are string-to-string maps; every metadata value is
/// coerced to its textual representation before transmission.
fn stringify_meta(meta: Option<&serde_json::Value>) -> Option<HashMap<String, String>> {
    let object = meta?.as_object()?;

    let mut formatted = HashMap::with_capacity(object.len());
    for (key, value) in object {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        formatted.insert(key.clone(), text);
    }
    Some(formatted)
}

impl FirebasePushGateway {
    async fn dispatch(
        &self,
        token: Option<String>,
        topic: Option<String>,
        title: String,
        body: String,
        data: Option<HashMap<String, String>>,
    ) -> Result<NotificationResult, BoxedError> {
        let message = FcmMessage {
            message: Message {
                token,
                topic,
                notification: Some(Notification { title, body }),
                data,
            },
        };

        let message_id = self
            .client
            .send_message(message)
            .await
            .map_err(|e| BoxedError(Box::new(e)))?;

        Ok(NotificationResult {
            id: message_id,
            status: "sent".to_string(),
        })
    }
}

impl NotificationGateway for FirebasePushGateway {
    type Error = BoxedError;

    fn send_to_device(
        &self,
        token: &str,
        title: &str,
        body: &str,
        meta: Option<&serde_json::Value>,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let token = token.to_string();
        let title = title.to_string();
        let body = body.to_string();
        let data = stringify_meta(meta);

        Box::pin(async move {
            let result = self.dispatch(Some(token), None, title, body, data).await?;
            info!("Sent message to device: {}", result.id);
            Ok(result)
        })
    }

    fn send_to_topic(
        &self,
        topic: &str,
        title: &str,
        body: &str,
        meta: Option<&serde_json::Value>,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let topic = topic.to_string();
        let title = title.to_string();
        let body = body.to_string();
        let data = stringify_meta(meta);

        Box::pin(async move {
            let result = self.dispatch(None, Some(topic), title, body, data).await?;
            info!("Sent message to topic: {}", result.id);
            Ok(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stringifies_non_string_meta_values() {
        let meta = json!({
            "prayerName": "Fajr",
            "notifyBeforeMinutes": 5,
            "silent": false,
        });

        let formatted = stringify_meta(Some(&meta)).unwrap();
        assert_eq!(formatted["prayerName"], "Fajr");
        assert_eq!(formatted["notifyBeforeMinutes"], "5");
        assert_eq!(formatted["silent"], "false");
    }

    #[test]
    fn non_object_meta_is_dropped() {
        assert!(stringify_meta(Some(&json!("just a string"))).is_none());
        assert!(stringify_meta(None).is_none());
    }
}
