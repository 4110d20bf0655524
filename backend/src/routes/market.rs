use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/market_prices",
            get(commands::market::get_market_prices_axum),
        )
        .route("/api/sell_crop", post(commands::market::sell_crop_axum))
        .route(
            "/api/download_market_data",
            get(commands::market::download_market_data_axum),
        )
}
