//! Order manager
//!
//! All item and order status mutations go through here. Each single-order
//! mutation is one write transaction: read the order, validate through the
//! state machine, apply side effects (stock restore, sale records), run the
//! aggregate reducer, write the order back. redb serializes write
//! transactions, so two concurrent updates on the same order cannot clobber
//! each other's history append; the version counter records mutation depth.

use crate::db::{StorageError, StoreStorage};
use crate::orders::reducer::{derive_order_status, validate_order_status_change};
use crate::orders::transition::can_transition;
use crate::sales::SalesService;
use crate::stock::StockService;
use redb::WriteTransaction;
use serde::Serialize;
use shared::models::{
    Actor, BulkItemError, BulkItemResult, BulkUpdateOutcome, ItemHistoryEntry, ItemStatus,
    ItemStatusUpdate, Order, OrderHistoryEntry, OrderStatus,
};
use shared::util::now_millis;
use shared::{CoreError, CoreResult};
use tracing::{info, warn};

/// Outcome of a single item transition
#[derive(Debug, Clone, Serialize)]
pub struct ItemTransitionOutcome {
    pub item_status: ItemStatus,
    pub order_status: OrderStatus,
}

/// Outcome of an order cancellation
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub status: OrderStatus,
    /// Units returned to stock across all cancelled lines
    pub stock_restored: i64,
}

#[derive(Clone)]
pub struct OrderManager {
    storage: StoreStorage,
    stock: StockService,
    sales: SalesService,
}

impl OrderManager {
    pub fn new(storage: StoreStorage, stock: StockService, sales: SalesService) -> Self {
        Self { storage, stock, sales }
    }

    pub fn get_order(&self, order_id: &str) -> CoreResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| CoreError::not_found(format!("order {} not found", order_id)))
    }

    pub fn list_orders_by_user(&self, user_id: &str) -> CoreResult<Vec<Order>> {
        Ok(self.storage.list_orders_by_user(user_id)?)
    }

    /// Transition one line item, with side effects and aggregate recompute,
    /// in a single transaction.
    pub fn update_item_status(
        &self,
        order_id: &str,
        item_index: usize,
        new_status: ItemStatus,
        message: Option<String>,
        actor: Actor,
    ) -> CoreResult<ItemTransitionOutcome> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_order_txn(&txn, order_id)?;
        let outcome =
            self.apply_item_transition(&txn, &mut order, item_index, new_status, message, &actor)?;
        self.finish_mutation(&txn, &mut order)?;
        txn.commit().map_err(StorageError::from)?;
        info!(
            order_id,
            item_index,
            item_status = %outcome.item_status,
            order_status = %outcome.order_status,
            "item status updated"
        );
        Ok(outcome)
    }

    /// Apply a batch of item transitions, each in its own transaction.
    ///
    /// A failed item never reverts items that already succeeded; the outcome
    /// reports both sides per index.
    pub fn bulk_update_items(
        &self,
        order_id: &str,
        updates: Vec<ItemStatusUpdate>,
        actor: Actor,
    ) -> CoreResult<BulkUpdateOutcome> {
        // Surface a missing order as one NotFound instead of n copies
        self.get_order(order_id)?;

        let mut outcome = BulkUpdateOutcome {
            updated: Vec::new(),
            errors: Vec::new(),
        };
        for update in updates {
            match self.update_item_status(
                order_id,
                update.index,
                update.status,
                update.message,
                actor.clone(),
            ) {
                Ok(result) => outcome.updated.push(BulkItemResult {
                    index: update.index,
                    item_status: result.item_status,
                    order_status: result.order_status,
                }),
                Err(err) => {
                    warn!(order_id, index = update.index, %err, "bulk item update failed");
                    outcome.errors.push(BulkItemError {
                        index: update.index,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Directly set the order-level status, advancing lagging active items to
    /// match. Validated against item reality first; cancellation routes
    /// through the same per-item side effects as single-item cancels.
    pub fn update_order_status(
        &self,
        order_id: &str,
        requested: OrderStatus,
        message: Option<String>,
        actor: Actor,
    ) -> CoreResult<OrderStatus> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_order_txn(&txn, order_id)?;
        validate_order_status_change(&order.items, order.status, requested)?;
        let now = now_millis();

        match requested {
            OrderStatus::Cancelled => {
                self.cancel_all_active_items(&txn, &mut order, &message, &actor, now)?;
            }
            OrderStatus::Delivered => {
                // validate guarantees every active item is already delivered
            }
            _ => {
                let target = match requested {
                    OrderStatus::Processing => ItemStatus::Processing,
                    OrderStatus::Shipped => ItemStatus::Shipped,
                    _ => unreachable!("pending is never a valid requested status"),
                };
                for item in &mut order.items {
                    if item.status.is_terminal() {
                        continue;
                    }
                    if can_transition(item.status, target).is_ok() {
                        item.status = target;
                        item.status_history.push(ItemHistoryEntry {
                            status: target,
                            message: message.clone(),
                            actor: actor.clone(),
                            at: now,
                        });
                    }
                }
            }
        }

        let derived = derive_order_status(&order.items);
        order.status = derived;
        order.status_history.push(OrderHistoryEntry {
            status: derived,
            message,
            actor,
            auto_derived: false,
            at: now,
        });
        self.finish_mutation(&txn, &mut order)?;
        txn.commit().map_err(StorageError::from)?;
        info!(order_id, status = %derived, "order status updated");
        Ok(derived)
    }

    /// Cancel every non-terminal item, restoring its stock.
    pub fn cancel_order(
        &self,
        order_id: &str,
        actor: Actor,
        reason: Option<String>,
    ) -> CoreResult<CancelOutcome> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_order_txn(&txn, order_id)?;
        if order.items.iter().all(|i| i.status.is_terminal()) {
            return Err(CoreError::conflict(format!(
                "order {} has no active items to cancel",
                order_id
            )));
        }
        let now = now_millis();
        let restored = self.cancel_all_active_items(&txn, &mut order, &reason, &actor, now)?;

        let derived = derive_order_status(&order.items);
        order.status = derived;
        order.status_history.push(OrderHistoryEntry {
            status: derived,
            message: reason,
            actor,
            auto_derived: false,
            at: now,
        });
        self.finish_mutation(&txn, &mut order)?;
        txn.commit().map_err(StorageError::from)?;
        info!(order_id, status = %derived, stock_restored = restored, "order cancelled");
        Ok(CancelOutcome {
            status: derived,
            stock_restored: restored,
        })
    }

    // ========== Internals ==========

    fn load_order_txn(&self, txn: &WriteTransaction, order_id: &str) -> CoreResult<Order> {
        self.storage
            .get_order_txn(txn, order_id)?
            .ok_or_else(|| CoreError::not_found(format!("order {} not found", order_id)))
    }

    /// Validate and apply one item transition plus its side effects; the
    /// caller owns the transaction and the final write-back.
    fn apply_item_transition(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
        item_index: usize,
        new_status: ItemStatus,
        message: Option<String>,
        actor: &Actor,
    ) -> CoreResult<ItemTransitionOutcome> {
        let item_count = order.items.len();
        let item = order.items.get_mut(item_index).ok_or_else(|| {
            CoreError::not_found(format!(
                "order {} has {} items, no index {}",
                order.id, item_count, item_index
            ))
        })?;
        can_transition(item.status, new_status)?;

        let now = now_millis();
        item.status = new_status;
        item.status_history.push(ItemHistoryEntry {
            status: new_status,
            message,
            actor: actor.clone(),
            at: now,
        });
        let product_id = item.product_id.clone();
        let variant_sku = item.variant_sku.clone();
        let qty = item.qty;

        match new_status {
            ItemStatus::Cancelled => {
                // Restore failure aborts the whole transition (the txn is
                // dropped uncommitted), surfaced as a retryable Conflict
                self.stock
                    .restore_in_txn(txn, &product_id, &variant_sku, qty, &order.id, actor.clone())
                    .map_err(|e| {
                        CoreError::conflict(format!("stock restore failed: {}", e))
                    })?;
                self.sales
                    .remove_sale_in_txn(txn, &order.id, &product_id, &variant_sku)?;
            }
            ItemStatus::Delivered => {
                self.sales.record_delivered_sales_in_txn(txn, order)?;
            }
            _ => {}
        }

        let derived = derive_order_status(&order.items);
        if derived != order.status {
            order.status = derived;
            order.status_history.push(OrderHistoryEntry {
                status: derived,
                message: None,
                actor: Actor::System,
                auto_derived: true,
                at: now,
            });
        }
        Ok(ItemTransitionOutcome {
            item_status: new_status,
            order_status: order.status,
        })
    }

    /// Cancel every non-terminal item; returns total units restored
    fn cancel_all_active_items(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
        reason: &Option<String>,
        actor: &Actor,
        now: i64,
    ) -> CoreResult<i64> {
        let mut restored = 0;
        for item in &mut order.items {
            if item.status.is_terminal() {
                continue;
            }
            item.status = ItemStatus::Cancelled;
            item.status_history.push(ItemHistoryEntry {
                status: ItemStatus::Cancelled,
                message: reason.clone(),
                actor: actor.clone(),
                at: now,
            });
            self.stock
                .restore_in_txn(txn, &item.product_id, &item.variant_sku, item.qty, &order.id, actor.clone())
                .map_err(|e| CoreError::conflict(format!("stock restore failed: {}", e)))?;
            self.sales
                .remove_sale_in_txn(txn, &order.id, &item.product_id, &item.variant_sku)?;
            restored += item.qty;
        }
        Ok(restored)
    }

    fn finish_mutation(&self, txn: &WriteTransaction, order: &mut Order) -> CoreResult<()> {
        order.version += 1;
        order.updated_at = now_millis();
        self.storage.put_order_txn(txn, order)?;
        Ok(())
    }
}
