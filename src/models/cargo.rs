// src/models/cargo.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Cargo request as sent by the shipper app. Nothing is required; absent fields are empty.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CargoRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub cargo_details: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub weight: String,        // "2T", "1500" or a bare number
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to_location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub distance: String,      // "15km" or a bare number
    #[serde(default, deserialize_with = "lenient_string")]
    pub vehicle_type: String,
}

impl CargoRequest {
    /// Reads the callable `data` value. Anything that is not an object is an empty request.
    pub fn from_callable_data(data: Value) -> Self {
        match data {
            Value::Object(_) => serde_json::from_value(data).unwrap_or_else(|err| {
                tracing::warn!("Unreadable cargo request, treating as empty: {}", err);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn notification_body(&self) -> String {
        format!(
            "{} ({}) from {} to {}",
            self.cargo_details, self.weight, self.from_location, self.to_location
        )
    }
}

/// Booking made available to every truck owner through the topic broadcast
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CargoAlert {
    #[serde(default, deserialize_with = "lenient_string")]
    pub booking_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cargo_location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cargo_type: String,
}

impl CargoAlert {
    pub fn from_callable_data(data: Value) -> Self {
        match data {
            Value::Object(_) => serde_json::from_value(data).unwrap_or_else(|err| {
                tracing::warn!("Unreadable cargo alert, treating as empty: {}", err);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn notification_body(&self) -> String {
        format!(
            "Cargo from {} ({}) is ready for delivery.",
            self.cargo_location, self.cargo_type
        )
    }
}

/// Accepts strings, numbers and booleans; null or absent becomes "".
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    })
}
