//! Stock API Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::{
    Actor, ChainVerification, LowStockAlert, LowStockQuery, MovementQuery, StockMovement,
};

use crate::api::{ok, AppResponse, AppResult};
use crate::core::ServerState;
use crate::stock::MovementReceipt;

fn system_actor() -> Actor {
    Actor::System
}

#[derive(Deserialize)]
pub struct RestockRequest {
    pub qty: i64,
    pub note: Option<String>,
    pub unit_cost: Option<f64>,
    #[serde(default = "system_actor")]
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct AdjustRequest {
    pub new_qty: i64,
    pub reason: String,
    pub note: Option<String>,
    #[serde(default = "system_actor")]
    pub actor: Actor,
}

/// POST /api/stock/{product_id}/{sku}/restock
pub async fn restock(
    State(state): State<ServerState>,
    Path((product_id, sku)): Path<(String, String)>,
    Json(request): Json<RestockRequest>,
) -> AppResult<Json<AppResponse<MovementReceipt>>> {
    let receipt = state.stock.restock(
        &product_id,
        &sku,
        request.qty,
        request.actor,
        request.note,
        request.unit_cost,
    )?;
    Ok(ok(receipt))
}

/// POST /api/stock/{product_id}/{sku}/adjust - set stock to an absolute value
pub async fn adjust(
    State(state): State<ServerState>,
    Path((product_id, sku)): Path<(String, String)>,
    Json(request): Json<AdjustRequest>,
) -> AppResult<Json<AppResponse<MovementReceipt>>> {
    let receipt = state.stock.adjust_stock(
        &product_id,
        &sku,
        request.new_qty,
        request.actor,
        request.reason,
        request.note,
    )?;
    Ok(ok(receipt))
}

/// GET /api/stock/alerts
pub async fn low_stock_alerts(
    State(state): State<ServerState>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<AppResponse<Vec<LowStockAlert>>>> {
    let alerts = state.reports.low_stock_alerts(&query)?;
    Ok(ok(alerts))
}

/// GET /api/stock/movements - filtered ledger scan
pub async fn movements(
    State(state): State<ServerState>,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<AppResponse<Vec<StockMovement>>>> {
    let movements = state.reports.movement_report(&query)?;
    Ok(ok(movements))
}

/// GET /api/stock/movements/verify - hash chain verification
pub async fn verify_chain(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<ChainVerification>>> {
    let report = state.reports.verify_movement_chain()?;
    Ok(ok(report))
}
