use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub mod integrations;
pub mod mutations;
pub mod socket;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(mutations::router())
        .merge(integrations::router())
        .merge(socket::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
