//! API routing
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`products`] - catalog management
//! - [`carts`] - shopping carts
//! - [`checkout`] - checkout endpoint
//! - [`orders`] - order and item status management
//! - [`stock`] - stock operations, alerts, movement ledger
//! - [`reports`] - sales reporting

pub mod carts;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod reports;
pub mod stock;

use crate::core::ServerState;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-export common types for handlers
pub use crate::utils::{ok, ok_with_message, AppError, AppResponse, AppResult};

pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(carts::router())
        .merge(checkout::router())
        .merge(orders::router())
        .merge(stock::router())
        .merge(reports::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
