//! Stock API module

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/stock", stock_routes())
}

fn stock_routes() -> Router<ServerState> {
    Router::new()
        .route("/alerts", get(handler::low_stock_alerts))
        .route("/movements", get(handler::movements))
        .route("/movements/verify", get(handler::verify_chain))
        .route("/{product_id}/{sku}/restock", post(handler::restock))
        .route("/{product_id}/{sku}/adjust", post(handler::adjust))
}
