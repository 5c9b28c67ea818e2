//! Order API Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::models::{
    Actor, BulkUpdateOutcome, ItemStatus, ItemStatusUpdate, Order, OrderStatus,
};

use crate::api::{ok, AppResponse, AppResult};
use crate::core::ServerState;
use crate::orders::{CancelOutcome, ItemTransitionOutcome};

fn system_actor() -> Actor {
    Actor::System
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct ItemStatusRequest {
    pub status: ItemStatus,
    pub message: Option<String>,
    #[serde(default = "system_actor")]
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct BulkStatusRequest {
    pub updates: Vec<ItemStatusUpdate>,
    #[serde(default = "system_actor")]
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
    pub message: Option<String>,
    #[serde(default = "system_actor")]
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
    #[serde(default = "system_actor")]
    pub actor: Actor,
}

#[derive(Serialize)]
pub struct OrderStatusResponse {
    pub status: OrderStatus,
}

/// GET /api/orders?user_id= - a user's orders, oldest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = state.orders.list_orders_by_user(&query.user_id)?;
    Ok(ok(orders))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.orders.get_order(&id)?;
    Ok(ok(order))
}

/// PUT /api/orders/{id}/items/{index}/status
pub async fn update_item_status(
    State(state): State<ServerState>,
    Path((id, index)): Path<(String, usize)>,
    Json(request): Json<ItemStatusRequest>,
) -> AppResult<Json<AppResponse<ItemTransitionOutcome>>> {
    let outcome = state.orders.update_item_status(
        &id,
        index,
        request.status,
        request.message,
        request.actor,
    )?;
    Ok(ok(outcome))
}

/// PUT /api/orders/{id}/items/status - bulk item updates
pub async fn bulk_update_items(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<BulkStatusRequest>,
) -> AppResult<Json<AppResponse<BulkUpdateOutcome>>> {
    let outcome = state
        .orders
        .bulk_update_items(&id, request.updates, request.actor)?;
    Ok(ok(outcome))
}

/// PUT /api/orders/{id}/status - direct order-level status change
pub async fn update_order_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<OrderStatusRequest>,
) -> AppResult<Json<AppResponse<OrderStatusResponse>>> {
    let status = state
        .orders
        .update_order_status(&id, request.status, request.message, request.actor)?;
    Ok(ok(OrderStatusResponse { status }))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> AppResult<Json<AppResponse<CancelOutcome>>> {
    let outcome = state.orders.cancel_order(&id, request.actor, request.reason)?;
    Ok(ok(outcome))
}
