// src/services/dispatcher.rs
use std::sync::Arc;

use crate::{
    errors::NotifyResult,
    models::{
        cargo::{CargoAlert, CargoRequest},
        dispatch::DispatchResult,
        notification::{PushPayload, TRUCK_OWNER_TOPIC, TopicPayload},
        recipient::collect_tokens,
    },
    services::{messaging_service::PushSender, token_store::TokenStore},
};

/// Relays a cargo request to every registered truck owner device.
pub struct NotificationDispatcher {
    token_store: Arc<dyn TokenStore>,
    push_sender: Arc<dyn PushSender>,
}

enum Delivery {
    Sent,
    NoRecipients,
}

impl NotificationDispatcher {
    pub fn new(token_store: Arc<dyn TokenStore>, push_sender: Arc<dyn PushSender>) -> Self {
        Self {
            token_store,
            push_sender,
        }
    }

    /// Never fails: upstream errors are folded into an unsuccessful result.
    pub async fn dispatch(&self, request: &CargoRequest) -> DispatchResult {
        match self.deliver(request).await {
            Ok(Delivery::Sent) => DispatchResult::sent(),
            Ok(Delivery::NoRecipients) => DispatchResult::no_recipients(),
            Err(err) => {
                tracing::error!("Error sending notification: {}", err);
                DispatchResult::failed(err.to_string())
            }
        }
    }

    /// Publishes a cargo alert to the truck owner topic. No token read is involved.
    pub async fn broadcast_cargo_available(&self, alert: &CargoAlert) -> DispatchResult {
        let payload = TopicPayload::from(alert);
        tracing::info!(
            booking_id = %alert.booking_id,
            "Broadcasting cargo alert: {}",
            payload.notification.body
        );

        match self.push_sender.send_to_topic(TRUCK_OWNER_TOPIC, &payload).await {
            Ok(()) => DispatchResult::topic_sent(),
            Err(err) => {
                tracing::error!("Error sending topic notification: {}", err);
                DispatchResult::failed(err.to_string())
            }
        }
    }

    async fn deliver(&self, request: &CargoRequest) -> NotifyResult<Delivery> {
        let records = self.token_store.fetch_records().await?;
        let record_count = records.len();
        let tokens = collect_tokens(records);

        if tokens.is_empty() {
            tracing::warn!("No usable FCM tokens among {} records", record_count);
            return Ok(Delivery::NoRecipients);
        }

        let payload = PushPayload::from(request);
        tracing::info!(
            recipients = tokens.len(),
            records = record_count,
            "Dispatching cargo notification: {}",
            payload.notification.body
        );

        self.push_sender.send_multicast(&tokens, &payload).await?;
        Ok(Delivery::Sent)
    }
}
