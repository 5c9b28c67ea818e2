//! Checkout API Handlers

use axum::{extract::State, Json};

use crate::api::{ok_with_message, AppResponse, AppResult};
use crate::checkout::{CheckoutReceipt, CheckoutRequest};
use crate::core::ServerState;

/// POST /api/checkout
///
/// A stock `Conflict` here is retryable: the body names every line that
/// could not be reserved so the client can refresh its cart.
pub async fn checkout(
    State(state): State<ServerState>,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<AppResponse<CheckoutReceipt>>> {
    let receipt = state.checkout.checkout(request)?;
    Ok(ok_with_message(receipt, "Order placed"))
}
