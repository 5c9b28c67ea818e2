//! Health Handlers

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::{ok, AppResponse, AppResult};
use crate::core::ServerState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub environment: String,
    pub movement_count: u64,
}

/// GET /api/health
pub async fn health(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Health>>> {
    let movement_count = state
        .storage
        .movement_count()
        .map_err(shared::CoreError::from)?;
    Ok(ok(Health {
        status: "ok",
        environment: state.config.environment.clone(),
        movement_count,
    }))
}
