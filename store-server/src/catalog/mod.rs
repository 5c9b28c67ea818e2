//! Product catalog
//!
//! Creation seeds initial stock through the movement ledger: a variant
//! created with stock > 0 gets an `adjustment` entry in the same transaction,
//! so the ledger explains the full counter history from zero.

use crate::db::{MovementDraft, StorageError, StoreStorage};
use shared::models::{Actor, MovementKind, Product, ProductCreate, Variant};
use shared::util::{new_id, now_millis};
use shared::{CoreError, CoreResult};
use std::collections::HashSet;
use tracing::info;

#[derive(Clone)]
pub struct CatalogService {
    storage: StoreStorage,
}

impl CatalogService {
    pub fn new(storage: StoreStorage) -> Self {
        Self { storage }
    }

    pub fn create_product(&self, payload: ProductCreate, actor: Actor) -> CoreResult<Product> {
        let id = new_id();
        self.create_product_with_id(&id, payload, actor)
    }

    /// Create a product under an explicit id (deterministic ids in tests)
    pub fn create_product_with_id(
        &self,
        id: &str,
        payload: ProductCreate,
        actor: Actor,
    ) -> CoreResult<Product> {
        validate_payload(&payload)?;

        let now = now_millis();
        let product = Product {
            id: id.to_string(),
            name: payload.name,
            description: payload.description,
            category: payload.category,
            is_active: true,
            variants: payload
                .variants
                .into_iter()
                .map(|v| Variant {
                    sku: v.sku,
                    name: v.name,
                    price: v.price,
                    stock: v.stock,
                    low_stock_threshold: v.low_stock_threshold,
                    is_default: v.is_default,
                    is_active: true,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };

        let txn = self.storage.begin_write()?;
        if self.storage.get_product_txn(&txn, id)?.is_some() {
            return Err(CoreError::conflict(format!("product {} already exists", id)));
        }
        self.storage.put_product_txn(&txn, &product)?;
        for variant in &product.variants {
            if variant.stock > 0 {
                self.storage.append_movement(
                    &txn,
                    MovementDraft {
                        product_id: product.id.clone(),
                        variant_sku: variant.sku.clone(),
                        kind: MovementKind::Adjustment,
                        quantity: variant.stock,
                        stock_before: 0,
                        stock_after: variant.stock,
                        order_id: None,
                        actor: actor.clone(),
                        note: Some("initial stock".to_string()),
                        unit_cost: None,
                    },
                )?;
            }
        }
        txn.commit().map_err(StorageError::from)?;
        info!(product_id = %product.id, variants = product.variants.len(), "product created");
        Ok(product)
    }

    pub fn get_product(&self, id: &str) -> CoreResult<Product> {
        self.storage
            .get_product(id)?
            .ok_or_else(|| CoreError::not_found(format!("product {} not found", id)))
    }

    /// Active products, optionally filtered by category
    pub fn list_products(&self, category: Option<&str>) -> CoreResult<Vec<Product>> {
        let mut products = self.storage.list_products()?;
        products.retain(|p| p.is_active && category.map_or(true, |c| p.category.as_deref() == Some(c)));
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

fn validate_payload(payload: &ProductCreate) -> CoreResult<()> {
    if payload.name.trim().is_empty() {
        return Err(CoreError::invalid_argument("product name must not be empty"));
    }
    if payload.variants.is_empty() {
        return Err(CoreError::invalid_argument(
            "a product needs at least one variant",
        ));
    }
    let defaults = payload.variants.iter().filter(|v| v.is_default).count();
    if defaults != 1 {
        return Err(CoreError::invalid_argument(format!(
            "exactly one variant must be the default, got {}",
            defaults
        )));
    }
    let mut skus = HashSet::new();
    for variant in &payload.variants {
        if variant.sku.trim().is_empty() {
            return Err(CoreError::invalid_argument("variant sku must not be empty"));
        }
        if !skus.insert(variant.sku.as_str()) {
            return Err(CoreError::invalid_argument(format!(
                "duplicate variant sku {}",
                variant.sku
            )));
        }
        if variant.price < 0.0 {
            return Err(CoreError::invalid_argument(format!(
                "variant {} has a negative price",
                variant.sku
            )));
        }
        if variant.stock < 0 {
            return Err(CoreError::invalid_argument(format!(
                "variant {} has negative stock",
                variant.sku
            )));
        }
        if variant.low_stock_threshold < 0 {
            return Err(CoreError::invalid_argument(format!(
                "variant {} has a negative low-stock threshold",
                variant.sku
            )));
        }
    }
    Ok(())
}
