use crate::commands;
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(commands::auth::register_axum))
        .route("/api/login", post(commands::auth::login_axum))
}
