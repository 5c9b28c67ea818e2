//! Sales attribution
//!
//! A sale record exists per `(order, product, variant)` line once that line
//! is delivered. Recording is idempotent and removal tolerates absent
//! records, so the order state machine can call both unconditionally during
//! a transition.

use crate::db::{StorageError, StoreStorage};
use redb::WriteTransaction;
use shared::models::{ItemStatus, Order, SaleRecord, SalesSummary};
use shared::util::now_millis;
use shared::CoreResult;
use tracing::debug;

#[derive(Clone)]
pub struct SalesService {
    storage: StoreStorage,
}

impl SalesService {
    pub fn new(storage: StoreStorage) -> Self {
        Self { storage }
    }

    /// Record a sale for every delivered line of the order that does not
    /// have one yet. Returns the number of records written.
    pub fn record_delivered_sales(&self, order_id: &str) -> CoreResult<usize> {
        let txn = self.storage.begin_write()?;
        let order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| shared::CoreError::not_found(format!("order {} not found", order_id)))?;
        let written = self.record_delivered_sales_in_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(written)
    }

    pub fn record_delivered_sales_in_txn(
        &self,
        txn: &WriteTransaction,
        order: &Order,
    ) -> CoreResult<usize> {
        let mut written = 0;
        for item in &order.items {
            if item.status != ItemStatus::Delivered {
                continue;
            }
            if self
                .storage
                .sale_exists_txn(txn, &order.id, &item.product_id, &item.variant_sku)?
            {
                continue;
            }
            self.storage.insert_sale_txn(
                txn,
                &SaleRecord {
                    order_id: order.id.clone(),
                    product_id: item.product_id.clone(),
                    variant_sku: item.variant_sku.clone(),
                    qty: item.qty,
                    unit_price: item.unit_price,
                    line_total: item.line_total,
                    recorded_at: now_millis(),
                },
            )?;
            written += 1;
        }
        if written > 0 {
            debug!(order_id = %order.id, written, "sale records written");
        }
        Ok(written)
    }

    /// Remove the sale record for one line, if present. Returns whether a
    /// record was removed.
    pub fn remove_sale_in_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        product_id: &str,
        sku: &str,
    ) -> CoreResult<bool> {
        let removed = self.storage.remove_sale_txn(txn, order_id, product_id, sku)?;
        if removed {
            debug!(order_id, product_id, sku, "sale record removed");
        }
        Ok(removed)
    }

    /// Aggregate revenue over `[from, to]` (unix millis, inclusive, both
    /// optional)
    pub fn sales_summary(&self, from: Option<i64>, to: Option<i64>) -> CoreResult<SalesSummary> {
        let records = self.storage.sales_in_range(from, to)?;
        let total_qty: i64 = records.iter().map(|r| r.qty).sum();
        let total_revenue: f64 = records.iter().map(|r| r.line_total).sum();
        Ok(SalesSummary {
            from,
            to,
            record_count: records.len() as u64,
            total_qty,
            total_revenue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Actor, OrderHistoryEntry, OrderLineItem, OrderStatus, PaymentMethod};

    fn order_with_items(id: &str, items: Vec<OrderLineItem>) -> Order {
        let now = now_millis();
        let mut order = Order {
            id: id.to_string(),
            order_number: format!("ORD-{}", id),
            user_id: "u1".into(),
            items,
            status: OrderStatus::Processing,
            total_price: 0.0,
            total_qty: 0,
            payment_method: PaymentMethod::Cod,
            paid: false,
            shipping_address_id: "a1".into(),
            status_history: vec![OrderHistoryEntry {
                status: OrderStatus::Pending,
                message: None,
                actor: Actor::System,
                auto_derived: false,
                at: now,
            }],
            version: 1,
            created_at: now,
            updated_at: now,
        };
        order.recalculate_totals();
        order
    }

    fn line(product_id: &str, sku: &str, qty: i64, price: f64, status: ItemStatus) -> OrderLineItem {
        OrderLineItem {
            product_id: product_id.into(),
            variant_sku: sku.into(),
            name: format!("{} {}", product_id, sku),
            qty,
            unit_price: price,
            line_total: price * qty as f64,
            status,
            status_history: Vec::new(),
        }
    }

    #[test]
    fn records_only_delivered_lines_and_is_idempotent() {
        let storage = StoreStorage::open_in_memory().unwrap();
        let sales = SalesService::new(storage.clone());
        let order = order_with_items(
            "o1",
            vec![
                line("p1", "S1", 2, 10.0, ItemStatus::Delivered),
                line("p2", "S2", 1, 5.0, ItemStatus::Shipped),
            ],
        );
        let txn = storage.begin_write().unwrap();
        storage.put_order_txn(&txn, &order).unwrap();
        txn.commit().unwrap();

        assert_eq!(sales.record_delivered_sales("o1").unwrap(), 1);
        // Second call writes nothing
        assert_eq!(sales.record_delivered_sales("o1").unwrap(), 0);

        let records = storage.list_sales().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_id, "p1");
        assert!((records[0].line_total - 20.0).abs() < 1e-6);
    }

    #[test]
    fn summary_totals_and_range_filter() {
        let storage = StoreStorage::open_in_memory().unwrap();
        let sales = SalesService::new(storage.clone());
        let order = order_with_items(
            "o1",
            vec![
                line("p1", "S1", 2, 10.0, ItemStatus::Delivered),
                line("p2", "S2", 3, 4.0, ItemStatus::Delivered),
            ],
        );
        let txn = storage.begin_write().unwrap();
        storage.put_order_txn(&txn, &order).unwrap();
        txn.commit().unwrap();
        sales.record_delivered_sales("o1").unwrap();

        let summary = sales.sales_summary(None, None).unwrap();
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.total_qty, 5);
        assert!((summary.total_revenue - 32.0).abs() < 1e-6);

        // Window entirely in the past matches nothing
        let empty = sales.sales_summary(Some(0), Some(1)).unwrap();
        assert_eq!(empty.record_count, 0);
        assert!((empty.total_revenue - 0.0).abs() < 1e-6);
    }

    #[test]
    fn remove_tolerates_missing_record() {
        let storage = StoreStorage::open_in_memory().unwrap();
        let sales = SalesService::new(storage.clone());
        let txn = storage.begin_write().unwrap();
        assert!(!sales.remove_sale_in_txn(&txn, "o1", "p1", "S1").unwrap());
        txn.commit().unwrap();
    }
}
