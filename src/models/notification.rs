// src/models/notification.rs
use serde::Serialize;

use super::cargo::{CargoAlert, CargoRequest};

pub const NOTIFICATION_TITLE: &str = "🚚 New Cargo Request";
pub const CARGO_AVAILABLE_TITLE: &str = "🚚 New Cargo Available!";
pub const TRUCK_OWNER_TOPIC: &str = "/topics/truck_owner";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// Key/value data for the client app. FCM only accepts string values here.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CargoData {
    pub cargo_details: String,
    pub weight: String,
    pub from_location: String,
    pub to_location: String,
    pub distance: String,
    pub vehicle_type: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PushPayload {
    pub notification: PushNotification,
    pub data: CargoData,
}

impl From<&CargoRequest> for PushPayload {
    fn from(request: &CargoRequest) -> Self {
        Self {
            notification: PushNotification {
                title: NOTIFICATION_TITLE.to_string(),
                body: request.notification_body(),
            },
            data: CargoData {
                cargo_details: request.cargo_details.clone(),
                weight: request.weight.clone(),
                from_location: request.from_location.clone(),
                to_location: request.to_location.clone(),
                distance: request.distance.clone(),
                vehicle_type: request.vehicle_type.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CargoAlertData {
    pub booking_id: String,
    pub cargo_location: String,
    pub cargo_type: String,
}

/// Payload published to a topic rather than to individual devices
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TopicPayload {
    pub notification: PushNotification,
    pub data: CargoAlertData,
}

impl From<&CargoAlert> for TopicPayload {
    fn from(alert: &CargoAlert) -> Self {
        Self {
            notification: PushNotification {
                title: CARGO_AVAILABLE_TITLE.to_string(),
                body: alert.notification_body(),
            },
            data: CargoAlertData {
                booking_id: alert.booking_id.clone(),
                cargo_location: alert.cargo_location.clone(),
                cargo_type: alert.cargo_type.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_wire_shape() {
        let request = CargoRequest {
            cargo_details: "Steel beams".to_string(),
            weight: "2T".to_string(),
            from_location: "Depot A".to_string(),
            to_location: "Site B".to_string(),
            distance: "15km".to_string(),
            vehicle_type: "Flatbed".to_string(),
        };

        let value = serde_json::to_value(PushPayload::from(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "notification": {
                    "title": "🚚 New Cargo Request",
                    "body": "Steel beams (2T) from Depot A to Site B"
                },
                "data": {
                    "cargoDetails": "Steel beams",
                    "weight": "2T",
                    "fromLocation": "Depot A",
                    "toLocation": "Site B",
                    "distance": "15km",
                    "vehicleType": "Flatbed"
                }
            })
        );
    }

    #[test]
    fn test_empty_request_has_string_data() {
        let payload = PushPayload::from(&CargoRequest::default());
        let data = serde_json::to_value(&payload.data).unwrap();

        for (_, value) in data.as_object().unwrap() {
            assert_eq!(value, &json!(""));
        }
        assert_eq!(payload.notification.body, " () from  to ");
    }

    #[test]
    fn test_topic_payload_wire_shape() {
        let alert = CargoAlert {
            booking_id: "bk-77".to_string(),
            cargo_location: "Kumasi".to_string(),
            cargo_type: "Cocoa".to_string(),
        };

        let value = serde_json::to_value(TopicPayload::from(&alert)).unwrap();
        assert_eq!(
            value,
            json!({
                "notification": {
                    "title": "🚚 New Cargo Available!",
                    "body": "Cargo from Kumasi (Cocoa) is ready for delivery."
                },
                "data": {
                    "bookingId": "bk-77",
                    "cargoLocation": "Kumasi",
                    "cargoType": "Cocoa"
                }
            })
        );
    }
}
