use crate::commands;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

// Phone camera photos routinely exceed axum's 2 MB default.
const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/recommend", post(commands::soil::recommend_axum))
        .route(
            "/api/detect_disease",
            post(commands::disease::detect_disease_axum).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route(
            "/api/disease_info/{name}",
            get(commands::disease::get_disease_info_axum),
        )
}
