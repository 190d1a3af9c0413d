// src/services/messaging_service.rs
use async_trait::async_trait;
use tracing;

use crate::{
    errors::{NotifyError as AppError, NotifyResult},
    models::notification::{PushPayload, TopicPayload},
};

/// Delivers one payload to a list of device tokens, or to a topic, in a single call.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send_multicast(&self, tokens: &[String], payload: &PushPayload) -> NotifyResult<()>;
    async fn send_to_topic(&self, topic: &str, payload: &TopicPayload) -> NotifyResult<()>;
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub fcm_server_key: String,
}

/// FCM legacy HTTP API, addressed with `registration_ids` or a `/topics/` name
pub struct FcmPushSender {
    config: FcmConfig,
    client: fcm::Client,
}

impl FcmPushSender {
    pub fn new(config: FcmConfig) -> Self {
        Self {
            config,
            client: fcm::Client::new(),
        }
    }

    pub fn with_server_key(server_key: String) -> Self {
        Self::new(FcmConfig {
            fcm_server_key: server_key,
        })
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send_multicast(&self, tokens: &[String], payload: &PushPayload) -> NotifyResult<()> {
        tracing::info!("Sending FCM notification to {} devices", tokens.len());

        let mut notification = fcm::NotificationBuilder::new();
        notification.title(&payload.notification.title);
        notification.body(&payload.notification.body);

        let mut message = fcm::MessageBuilder::new_multi(&self.config.fcm_server_key, tokens);
        message.notification(notification.finalize());
        message.data(&payload.data)?;

        let response = self
            .client
            .send(message.finalize())
            .await
            .map_err(|e| AppError::FcmDelivery(e.to_string()))?;

        if let Some(reason) = response.error {
            tracing::error!("FCM request rejected: {:?}", reason);
            return Err(AppError::FcmDelivery(format!("{:?}", reason)));
        }

        // Per-token outcomes are not reconciled
        tracing::debug!(
            success = ?response.success,
            failure = ?response.failure,
            "FCM multicast accepted"
        );
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, payload: &TopicPayload) -> NotifyResult<()> {
        tracing::info!("Sending FCM notification to topic {}", topic);

        let mut notification = fcm::NotificationBuilder::new();
        notification.title(&payload.notification.title);
        notification.body(&payload.notification.body);

        let mut message = fcm::MessageBuilder::new(&self.config.fcm_server_key, topic);
        message.notification(notification.finalize());
        message.data(&payload.data)?;

        let response = self
            .client
            .send(message.finalize())
            .await
            .map_err(|e| AppError::FcmDelivery(e.to_string()))?;

        if let Some(reason) = response.error {
            tracing::error!("FCM topic request rejected: {:?}", reason);
            return Err(AppError::FcmDelivery(format!("{:?}", reason)));
        }

        tracing::debug!(message_id = ?response.message_id, "FCM topic message accepted");
        Ok(())
    }
}

// Stand-in used when no server key is configured
#[derive(Debug)]
pub struct MockPushSender;

#[async_trait]
impl PushSender for MockPushSender {
    async fn send_multicast(&self, tokens: &[String], payload: &PushPayload) -> NotifyResult<()> {
        tracing::info!(
            "[MOCK] Would send FCM to {} devices: {} - {}",
            tokens.len(),
            payload.notification.title,
            payload.notification.body
        );
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, payload: &TopicPayload) -> NotifyResult<()> {
        tracing::info!(
            "[MOCK] Would send FCM to {}: {} - {}",
            topic,
            payload.notification.title,
            payload.notification.body
        );
        Ok(())
    }
}
