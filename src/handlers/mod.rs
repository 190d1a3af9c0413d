// src/handlers/mod.rs
pub mod notify_handler;

use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/notifyTruckOwners", post(notify_handler::notify_truck_owners))
        .route("/notifyCargoAvailable", post(notify_handler::notify_cargo_available))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
