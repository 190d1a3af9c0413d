// src/models/dispatch.rs
use serde::Serialize;

pub const NO_TOKENS_MESSAGE: &str = "No FCM tokens found.";
pub const SENT_MESSAGE: &str = "Notifications sent.";
pub const TOPIC_SENT_MESSAGE: &str = "Notification sent to truck_owner topic.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Sent,
    NoRecipients,
    UpstreamFailure,
}

/// What the caller gets back from one invocation. Only `success` and `message` go on the wire.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,
    #[serde(skip)]
    pub kind: DispatchKind,
}

impl DispatchResult {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: SENT_MESSAGE.to_string(),
            kind: DispatchKind::Sent,
        }
    }

    pub fn topic_sent() -> Self {
        Self {
            success: true,
            message: TOPIC_SENT_MESSAGE.to_string(),
            kind: DispatchKind::Sent,
        }
    }

    pub fn no_recipients() -> Self {
        Self {
            success: false,
            message: NO_TOKENS_MESSAGE.to_string(),
            kind: DispatchKind::NoRecipients,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            kind: DispatchKind::UpstreamFailure,
        }
    }
}

/// Callable protocol success envelope: `{"result": ...}`
#[derive(Debug, Serialize)]
pub struct CallableResponse {
    pub result: DispatchResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape_omits_kind() {
        let value = serde_json::to_value(DispatchResult::no_recipients()).unwrap();
        assert_eq!(value, json!({"success": false, "message": "No FCM tokens found."}));

        let value = serde_json::to_value(CallableResponse { result: DispatchResult::sent() }).unwrap();
        assert_eq!(
            value,
            json!({"result": {"success": true, "message": "Notifications sent."}})
        );
    }
}
