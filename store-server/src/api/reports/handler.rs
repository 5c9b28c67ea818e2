//! Report API Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use shared::models::{SalesQuery, SalesSummary};

use crate::api::{ok, AppResponse, AppResult};
use crate::core::ServerState;

/// GET /api/reports/sales?from=&to= (unix millis, inclusive)
pub async fn sales_summary(
    State(state): State<ServerState>,
    Query(query): Query<SalesQuery>,
) -> AppResult<Json<AppResponse<SalesSummary>>> {
    let summary = state.reports.sales_summary(query.from, query.to)?;
    Ok(ok(summary))
}
