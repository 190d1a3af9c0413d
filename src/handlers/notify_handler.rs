// src/handlers/notify_handler.rs
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{self, Instrument};
use uuid::Uuid;

use crate::{
    errors::{NotifyError as AppError, NotifyResult},
    models::{
        cargo::{CargoAlert, CargoRequest},
        dispatch::CallableResponse,
    },
    state::AppState,
};

/// Callable function entry point: `{"data": {...}}` in, `{"result": {...}}` out.
pub async fn notify_truck_owners(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> NotifyResult<Json<CallableResponse>> {
    let span = tracing::info_span!("notify_truck_owners", invocation_id = %Uuid::new_v4());
    handle(state, headers, body).instrument(span).await
}

async fn handle(
    state: Arc<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> NotifyResult<Json<CallableResponse>> {
    let request = CargoRequest::from_callable_data(callable_data(&body)?);

    // Caller identity is supplied by the platform and not checked here
    tracing::debug!(
        authenticated = headers.contains_key(AUTHORIZATION),
        "Received cargo notification request"
    );

    let result = state.dispatcher.dispatch(&request).await;
    Ok(Json(CallableResponse { result }))
}

/// Topic broadcast entry point, same envelope as `notify_truck_owners`.
pub async fn notify_cargo_available(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> NotifyResult<Json<CallableResponse>> {
    let span = tracing::info_span!("notify_cargo_available", invocation_id = %Uuid::new_v4());
    broadcast(state, body).instrument(span).await
}

async fn broadcast(state: Arc<AppState>, body: Bytes) -> NotifyResult<Json<CallableResponse>> {
    let alert = CargoAlert::from_callable_data(callable_data(&body)?);
    let result = state.dispatcher.broadcast_cargo_available(&alert).await;
    Ok(Json(CallableResponse { result }))
}

/// The `data` member of a callable request envelope
fn callable_data(body: &[u8]) -> NotifyResult<Value> {
    let envelope: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::bad_request(format!("Request body is not valid JSON: {}", e)))?;

    match envelope {
        Value::Object(mut fields) => fields
            .remove("data")
            .ok_or_else(|| AppError::bad_request("Bad Request")),
        _ => Err(AppError::bad_request("Request body must be a JSON object")),
    }
}
