//! Cart API module

mod handler;

use axum::{routing::get, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/carts/{user_id}",
        get(handler::get_cart).put(handler::put_cart),
    )
}
