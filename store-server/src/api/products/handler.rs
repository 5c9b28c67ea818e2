//! Product API Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::{Actor, Product, ProductCreate};

use crate::api::{ok, AppResponse, AppResult};
use crate::core::ServerState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateRequest {
    #[serde(flatten)]
    pub product: ProductCreate,
    #[serde(default = "system_actor")]
    pub actor: Actor,
}

fn system_actor() -> Actor {
    Actor::System
}

/// GET /api/products - list active products
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let products = state.catalog.list_products(query.category.as_deref())?;
    Ok(ok(products))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = state.catalog.get_product(&id)?;
    Ok(ok(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    Json(request): Json<CreateRequest>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = state.catalog.create_product(request.product, request.actor)?;
    Ok(ok(product))
}
