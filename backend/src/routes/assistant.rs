use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(commands::chat::chat_axum))
        .route("/api/weather", get(commands::weather::get_weather_axum))
}
