use crate::state::AppState;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

pub mod assistant;
pub mod auth;
pub mod diagnosis;
pub mod market;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .merge(auth::router())
        .merge(diagnosis::router())
        .merge(market::router())
        .merge(assistant::router())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "AgriVistara Backend is Running!" }))
}
