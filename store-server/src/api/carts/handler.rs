//! Cart API Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::models::{Cart, CartItem};
use shared::util::now_millis;
use shared::CoreError;

use crate::api::{ok, AppError, AppResponse, AppResult};
use crate::core::ServerState;
use crate::db::StorageError;

#[derive(Deserialize)]
pub struct PutCartRequest {
    pub items: Vec<CartItem>,
}

/// GET /api/carts/{user_id}
pub async fn get_cart(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<AppResponse<Cart>>> {
    let cart = state
        .storage
        .get_cart(&user_id)
        .map_err(CoreError::from)?
        .unwrap_or_else(|| Cart::empty(&user_id));
    Ok(ok(cart))
}

/// PUT /api/carts/{user_id} - replace the cart contents
pub async fn put_cart(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Json(request): Json<PutCartRequest>,
) -> AppResult<Json<AppResponse<Cart>>> {
    for item in &request.items {
        if item.qty <= 0 {
            return Err(AppError::validation(format!(
                "cart line for product {} must have a positive quantity",
                item.product_id
            )));
        }
    }
    let cart = Cart {
        user_id,
        items: request.items,
        updated_at: now_millis(),
    };
    let txn = state.storage.begin_write().map_err(CoreError::from)?;
    state
        .storage
        .put_cart_txn(&txn, &cart)
        .map_err(CoreError::from)?;
    txn.commit()
        .map_err(StorageError::from)
        .map_err(CoreError::from)?;
    Ok(ok(cart))
}
