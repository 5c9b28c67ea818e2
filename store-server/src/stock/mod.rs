//! Stock ledger and operations
//!
//! Four mutations exist: restock, adjust, deduct, restore. Each one pairs
//! the counter change with exactly one ledger entry in the same write
//! transaction; there is no code path that touches a variant's `stock`
//! without appending a movement.
//!
//! `deduct` is the hot path: it re-checks sufficiency inside the write
//! transaction that applies the decrement, so concurrent checkouts for the
//! same variant cannot double-spend. The `*_in_txn` variants let the
//! checkout orchestrator and the cancellation transition embed the same
//! logic in their own transactions.

pub mod ledger;

use crate::db::{MovementDraft, StorageError, StoreStorage};
use redb::WriteTransaction;
use serde::Serialize;
use shared::models::{Actor, MovementKind, Product, StockShortage, Variant};
use shared::{CoreError, CoreResult};
use tracing::{debug, info};

/// Result of a stock operation
#[derive(Debug, Clone, Serialize)]
pub struct MovementReceipt {
    pub movement_id: u64,
    pub new_stock: i64,
}

#[derive(Clone)]
pub struct StockService {
    storage: StoreStorage,
}

impl StockService {
    pub fn new(storage: StoreStorage) -> Self {
        Self { storage }
    }

    // ========== Public operations (own transaction) ==========

    /// Increase a variant's stock (goods received)
    pub fn restock(
        &self,
        product_id: &str,
        sku: &str,
        qty: i64,
        actor: Actor,
        note: Option<String>,
        unit_cost: Option<f64>,
    ) -> CoreResult<MovementReceipt> {
        if qty <= 0 {
            return Err(CoreError::invalid_argument(format!(
                "restock quantity must be positive, got {}",
                qty
            )));
        }
        let txn = self.storage.begin_write()?;
        let receipt = self.restock_in_txn(&txn, product_id, sku, qty, actor, note, unit_cost)?;
        txn.commit().map_err(StorageError::from)?;
        info!(product_id, sku, qty, new_stock = receipt.new_stock, "stock restocked");
        Ok(receipt)
    }

    /// Set a variant's stock to an absolute value (physical count)
    ///
    /// A no-op (`new_qty` equal to current stock) is rejected rather than
    /// silently accepted, to guard against accidental duplicate calls.
    pub fn adjust_stock(
        &self,
        product_id: &str,
        sku: &str,
        new_qty: i64,
        actor: Actor,
        reason: String,
        note: Option<String>,
    ) -> CoreResult<MovementReceipt> {
        if new_qty < 0 {
            return Err(CoreError::invalid_argument(format!(
                "adjusted stock must be non-negative, got {}",
                new_qty
            )));
        }
        let txn = self.storage.begin_write()?;
        let receipt = {
            let mut product = self.load_product(&txn, product_id)?;
            let variant = variant_mut(&mut product, product_id, sku)?;
            let before = variant.stock;
            let delta = new_qty - before;
            if delta == 0 {
                return Err(CoreError::invalid_argument(format!(
                    "stock for {}/{} is already {}",
                    product_id, sku, new_qty
                )));
            }
            variant.stock = new_qty;
            log_derived_status(variant);
            self.storage.put_product_txn(&txn, &product)?;
            let movement = self.storage.append_movement(
                &txn,
                MovementDraft {
                    product_id: product_id.to_string(),
                    variant_sku: sku.to_string(),
                    kind: MovementKind::Adjustment,
                    quantity: delta.abs(),
                    stock_before: before,
                    stock_after: new_qty,
                    order_id: None,
                    actor,
                    note: Some(match note {
                        Some(n) => format!("{}: {}", reason, n),
                        None => reason,
                    }),
                    unit_cost: None,
                },
            )?;
            MovementReceipt {
                movement_id: movement.id,
                new_stock: new_qty,
            }
        };
        txn.commit().map_err(StorageError::from)?;
        info!(product_id, sku, new_stock = receipt.new_stock, "stock adjusted");
        Ok(receipt)
    }

    /// Conditional compare-and-decrement (checkout reservation)
    pub fn deduct(
        &self,
        product_id: &str,
        sku: &str,
        qty: i64,
        order_id: &str,
    ) -> CoreResult<MovementReceipt> {
        if qty <= 0 {
            return Err(CoreError::invalid_argument(format!(
                "deduct quantity must be positive, got {}",
                qty
            )));
        }
        let txn = self.storage.begin_write()?;
        let receipt = self.deduct_in_txn(&txn, product_id, sku, qty, order_id)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(receipt)
    }

    /// Inverse of deduct, applied when an item is cancelled
    pub fn restore(
        &self,
        product_id: &str,
        sku: &str,
        qty: i64,
        order_id: &str,
        actor: Actor,
    ) -> CoreResult<MovementReceipt> {
        if qty <= 0 {
            return Err(CoreError::invalid_argument(format!(
                "restore quantity must be positive, got {}",
                qty
            )));
        }
        let txn = self.storage.begin_write()?;
        let receipt = self.restore_in_txn(&txn, product_id, sku, qty, order_id, actor)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(receipt)
    }

    // ========== Transaction-scoped operations ==========

    pub fn restock_in_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        sku: &str,
        qty: i64,
        actor: Actor,
        note: Option<String>,
        unit_cost: Option<f64>,
    ) -> CoreResult<MovementReceipt> {
        let mut product = self.load_product(txn, product_id)?;
        let variant = variant_mut(&mut product, product_id, sku)?;
        let before = variant.stock;
        variant.stock = before + qty;
        let after = variant.stock;
        log_derived_status(variant);
        self.storage.put_product_txn(txn, &product)?;
        let movement = self.storage.append_movement(
            txn,
            MovementDraft {
                product_id: product_id.to_string(),
                variant_sku: sku.to_string(),
                kind: MovementKind::Restock,
                quantity: qty,
                stock_before: before,
                stock_after: after,
                order_id: None,
                actor,
                note,
                unit_cost,
            },
        )?;
        Ok(MovementReceipt {
            movement_id: movement.id,
            new_stock: after,
        })
    }

    /// Deduct within the caller's transaction.
    ///
    /// The sufficiency check happens here, against the stock value visible to
    /// THIS transaction; an earlier advisory read is irrelevant. Insufficient
    /// stock returns `InsufficientStock` and the caller aborts by dropping
    /// the transaction.
    pub fn deduct_in_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        sku: &str,
        qty: i64,
        order_id: &str,
    ) -> CoreResult<MovementReceipt> {
        let mut product = self.load_product(txn, product_id)?;
        let variant = variant_mut(&mut product, product_id, sku)?;
        let before = variant.stock;
        if before < qty {
            debug!(product_id, sku, requested = qty, available = before, "deduct refused");
            return Err(CoreError::InsufficientStock(vec![StockShortage {
                product_id: product_id.to_string(),
                variant_sku: sku.to_string(),
                requested: qty,
                available: before,
            }]));
        }
        variant.stock = before - qty;
        let after = variant.stock;
        log_derived_status(variant);
        self.storage.put_product_txn(txn, &product)?;
        let movement = self.storage.append_movement(
            txn,
            MovementDraft {
                product_id: product_id.to_string(),
                variant_sku: sku.to_string(),
                kind: MovementKind::Sale,
                quantity: qty,
                stock_before: before,
                stock_after: after,
                order_id: Some(order_id.to_string()),
                actor: Actor::System,
                note: None,
                unit_cost: None,
            },
        )?;
        Ok(MovementReceipt {
            movement_id: movement.id,
            new_stock: after,
        })
    }

    pub fn restore_in_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        sku: &str,
        qty: i64,
        order_id: &str,
        actor: Actor,
    ) -> CoreResult<MovementReceipt> {
        let mut product = self.load_product(txn, product_id)?;
        let variant = variant_mut(&mut product, product_id, sku)?;
        let before = variant.stock;
        variant.stock = before + qty;
        let after = variant.stock;
        log_derived_status(variant);
        self.storage.put_product_txn(txn, &product)?;
        let movement = self.storage.append_movement(
            txn,
            MovementDraft {
                product_id: product_id.to_string(),
                variant_sku: sku.to_string(),
                kind: MovementKind::Restock,
                quantity: qty,
                stock_before: before,
                stock_after: after,
                order_id: Some(order_id.to_string()),
                actor,
                note: Some("stock restored on cancellation".to_string()),
                unit_cost: None,
            },
        )?;
        Ok(MovementReceipt {
            movement_id: movement.id,
            new_stock: after,
        })
    }

    // ========== Helpers ==========

    fn load_product(&self, txn: &WriteTransaction, product_id: &str) -> CoreResult<Product> {
        self.storage
            .get_product_txn(txn, product_id)?
            .ok_or_else(|| CoreError::not_found(format!("product {} not found", product_id)))
    }
}

fn variant_mut<'a>(
    product: &'a mut Product,
    product_id: &str,
    sku: &str,
) -> CoreResult<&'a mut Variant> {
    product
        .variant_mut(sku)
        .ok_or_else(|| CoreError::not_found(format!("variant {}/{} not found", product_id, sku)))
}

fn log_derived_status(variant: &Variant) {
    debug!(
        sku = %variant.sku,
        stock = variant.stock,
        status = ?variant.stock_status(),
        "variant stock updated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{MovementQuery, ProductCreate, VariantCreate};
    use shared::util::now_millis;

    fn service_with_product(stock: i64) -> (StockService, StoreStorage) {
        let storage = StoreStorage::open_in_memory().unwrap();
        let catalog = crate::catalog::CatalogService::new(storage.clone());
        catalog
            .create_product_with_id(
                "p1",
                ProductCreate {
                    name: "Widget".into(),
                    description: None,
                    category: None,
                    variants: vec![VariantCreate {
                        sku: "SKU-1".into(),
                        name: "Default".into(),
                        price: 10.0,
                        stock,
                        low_stock_threshold: 2,
                        is_default: true,
                    }],
                },
                Actor::System,
            )
            .unwrap();
        (StockService::new(storage.clone()), storage)
    }

    #[test]
    fn restock_increases_stock_and_records_movement() {
        let (stock, storage) = service_with_product(5);
        let receipt = stock
            .restock("p1", "SKU-1", 3, Actor::System, Some("delivery".into()), Some(4.5))
            .unwrap();
        assert_eq!(receipt.new_stock, 8);

        let movements = storage
            .query_movements(&MovementQuery {
                product_id: Some("p1".into()),
                kind: Some(MovementKind::Restock),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(movements.len(), 1);
        let m = &movements[0];
        assert_eq!(m.quantity, 3);
        assert_eq!(m.stock_before, 5);
        assert_eq!(m.stock_after, 8);
        assert_eq!(m.unit_cost, Some(4.5));
        assert!(m.order_id.is_none());
    }

    #[test]
    fn restock_rejects_non_positive_quantity() {
        let (stock, _) = service_with_product(5);
        assert!(matches!(
            stock.restock("p1", "SKU-1", 0, Actor::System, None, None),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            stock.restock("p1", "SKU-1", -4, Actor::System, None, None),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn restock_unknown_variant_is_not_found() {
        let (stock, _) = service_with_product(5);
        assert!(matches!(
            stock.restock("p1", "NOPE", 1, Actor::System, None, None),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            stock.restock("ghost", "SKU-1", 1, Actor::System, None, None),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn adjust_records_absolute_delta() {
        let (stock, storage) = service_with_product(10);
        let receipt = stock
            .adjust_stock("p1", "SKU-1", 4, Actor::System, "shrinkage".into(), None)
            .unwrap();
        assert_eq!(receipt.new_stock, 4);

        // Last adjustment in the ledger is the shrinkage (the first is the
        // initial stock seeded at product creation)
        let movements = storage
            .query_movements(&MovementQuery {
                kind: Some(MovementKind::Adjustment),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(movements.len(), 2);
        let m = movements.last().unwrap();
        assert_eq!(m.quantity, 6);
        assert_eq!(m.stock_before, 10);
        assert_eq!(m.stock_after, 4);
    }

    #[test]
    fn adjust_to_current_value_is_an_error() {
        let (stock, storage) = service_with_product(10);
        assert!(matches!(
            stock.adjust_stock("p1", "SKU-1", 10, Actor::System, "count".into(), None),
            Err(CoreError::InvalidArgument(_))
        ));
        // No movement may leak out of the refused call (only the initial
        // stock adjustment from product creation exists)
        assert_eq!(storage.movement_count().unwrap(), 1);
    }

    #[test]
    fn deduct_succeeds_and_pairs_with_sale_movement() {
        let (stock, storage) = service_with_product(5);
        let receipt = stock.deduct("p1", "SKU-1", 3, "order-1").unwrap();
        assert_eq!(receipt.new_stock, 2);

        let movements = storage
            .query_movements(&MovementQuery {
                kind: Some(MovementKind::Sale),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(movements.len(), 1);
        let m = &movements[0];
        assert_eq!(m.quantity, 3);
        assert_eq!(m.stock_before, 5);
        assert_eq!(m.stock_after, 2);
        assert_eq!(m.order_id.as_deref(), Some("order-1"));
    }

    #[test]
    fn deduct_insufficient_stock_is_conflict_not_invalid() {
        let (stock, storage) = service_with_product(2);
        let err = stock.deduct("p1", "SKU-1", 3, "order-1").unwrap_err();
        match err {
            CoreError::InsufficientStock(shortages) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].requested, 3);
                assert_eq!(shortages[0].available, 2);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
        // Stock untouched, no sale movement written
        let product = storage.get_product("p1").unwrap().unwrap();
        assert_eq!(product.variant("SKU-1").unwrap().stock, 2);
    }

    #[test]
    fn restore_reverses_a_deduct() {
        let (stock, storage) = service_with_product(5);
        stock.deduct("p1", "SKU-1", 4, "order-1").unwrap();
        let receipt = stock
            .restore("p1", "SKU-1", 4, "order-1", Actor::System)
            .unwrap();
        assert_eq!(receipt.new_stock, 5);

        let m = storage
            .query_movements(&MovementQuery {
                kind: Some(MovementKind::Restock),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].order_id.as_deref(), Some("order-1"));
    }

    #[test]
    fn every_operation_extends_an_intact_chain() {
        let (stock, storage) = service_with_product(10);
        stock.deduct("p1", "SKU-1", 2, "o1").unwrap();
        stock.restock("p1", "SKU-1", 5, Actor::System, None, None).unwrap();
        stock
            .adjust_stock("p1", "SKU-1", 7, Actor::System, "count".into(), None)
            .unwrap();
        stock.restore("p1", "SKU-1", 2, "o1", Actor::System).unwrap();

        let movements = storage.all_movements().unwrap();
        // initial adjustment + 4 operations
        assert_eq!(movements.len(), 5);
        let report = ledger::verify(&movements);
        assert!(report.chain_intact, "breaks: {:?}", report.breaks);

        // Every movement explains its own delta
        for m in &movements {
            let delta = (m.stock_after - m.stock_before).abs();
            assert_eq!(delta, m.quantity);
            assert!(m.quantity > 0);
            if m.kind == MovementKind::Sale {
                assert!(m.order_id.is_some());
            }
            assert!(m.timestamp <= now_millis());
        }
    }
}
