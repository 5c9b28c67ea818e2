//! Order API module

mod handler;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_order_status))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/items/status", put(handler::bulk_update_items))
        .route(
            "/{id}/items/{index}/status",
            put(handler::update_item_status),
        )
}
