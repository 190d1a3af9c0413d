use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the truck-owner notification service
#[derive(Debug, Error)]
pub enum NotifyError {
    // Callable protocol errors
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    InternalServer(String),

    // Token store errors
    #[error("Firestore query error: {0}")]
    FirestoreQuery(String),
    #[error("Firebase database error: {0}")]
    FirebaseDatabase(String),
    #[error("Firestore authentication error: {0}")]
    FirestoreAuth(String),

    // Push delivery errors
    #[error("FCM delivery error: {0}")]
    FcmDelivery(String),

    // Network and HTTP client errors
    #[error("Network request timed out")]
    NetworkTimeout,
    #[error("Network connection error: {0}")]
    NetworkConnection(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    // Serialization and parsing errors
    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(String),

    // Configuration and setup errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Error body of the callable function protocol: `{"error": {"status", "message"}}`
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        let (status, error_status, message) = match self {
            NotifyError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg),
            NotifyError::NetworkTimeout => {
                (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED", self.to_string())
            }
            // Everything else is opaque to the caller
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "INTERNAL".to_string()),
        };

        let error_response = ErrorResponse {
            error: ErrorBody {
                status: error_status,
                message,
            },
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type NotifyResult<T> = Result<T, NotifyError>;

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotifyError::NetworkTimeout
        } else if err.is_connect() {
            NotifyError::NetworkConnection(err.to_string())
        } else if err.is_decode() {
            NotifyError::JsonParsing(err.to_string())
        } else {
            NotifyError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_eof() {
            NotifyError::JsonParsing(err.to_string())
        } else {
            NotifyError::JsonSerialization(err.to_string())
        }
    }
}

impl NotifyError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        NotifyError::BadRequest(msg.into())
    }

    pub fn missing_env(var: impl Into<String>) -> Self {
        NotifyError::MissingEnvironmentVariable(var.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        NotifyError::InvalidConfiguration(msg.into())
    }
}
