//! Checkout orchestrator
//!
//! One write transaction covers the whole checkout: resolve cart lines,
//! persist the address, build the order, deduct stock line by line, clear
//! the cart. The per-line deduct re-verifies sufficiency inside this
//! transaction; the earlier read-time check only produces a friendlier
//! error before any work is done. Any failure drops the transaction, so
//! there is never a partial order.
//!
//! The confirmation notification runs after commit, best-effort.

use crate::db::{StorageError, StoreStorage};
use crate::notify::Notifier;
use crate::stock::StockService;
use serde::{Deserialize, Serialize};
use shared::models::{
    Actor, Address, Cart, CartSelection, ItemStatus, Order, OrderHistoryEntry, OrderLineItem,
    OrderStatus, PaymentMethod, StockShortage,
};
use shared::util::{new_id, now_millis};
use shared::{CoreError, CoreResult};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// New shipping address payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 1, max = 100))]
    pub recipient: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 56))]
    pub country: String,
    pub phone: Option<String>,
}

/// Ship to a stored address or create one inline
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShippingAddress {
    Existing { address_id: String },
    New(AddressInput),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub selection: Vec<CartSelection>,
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_price: f64,
}

/// A cart line resolved to its effective variant
struct ResolvedLine {
    product_id: String,
    variant_sku: String,
    name: String,
    qty: i64,
    unit_price: f64,
}

#[derive(Clone)]
pub struct CheckoutService {
    storage: StoreStorage,
    stock: StockService,
    notifier: Arc<dyn Notifier>,
}

impl CheckoutService {
    pub fn new(storage: StoreStorage, stock: StockService, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, stock, notifier }
    }

    pub fn checkout(&self, request: CheckoutRequest) -> CoreResult<CheckoutReceipt> {
        if request.selection.is_empty() {
            return Err(CoreError::invalid_argument("selection must not be empty"));
        }

        let txn = self.storage.begin_write()?;
        let cart = self
            .storage
            .get_cart_txn(&txn, &request.user_id)?
            .ok_or_else(|| {
                CoreError::not_found(format!("no cart for user {}", request.user_id))
            })?;

        let lines = self.resolve_lines(&txn, &cart, &request.selection)?;
        let address_id = self.resolve_address(&txn, &request.user_id, &request.shipping)?;

        let now = now_millis();
        let order_id = new_id();
        let order_number = format!(
            "ORD{}{}",
            chrono::Utc::now().format("%Y%m%d"),
            10000 + self.storage.next_order_count_txn(&txn)?
        );
        let mut order = Order {
            id: order_id.clone(),
            order_number,
            user_id: request.user_id.clone(),
            items: lines
                .iter()
                .map(|l| OrderLineItem {
                    product_id: l.product_id.clone(),
                    variant_sku: l.variant_sku.clone(),
                    name: l.name.clone(),
                    qty: l.qty,
                    unit_price: l.unit_price,
                    line_total: l.unit_price * l.qty as f64,
                    status: ItemStatus::Pending,
                    status_history: Vec::new(),
                })
                .collect(),
            status: OrderStatus::Pending,
            total_price: 0.0,
            total_qty: 0,
            payment_method: request.payment_method,
            paid: false,
            shipping_address_id: address_id,
            status_history: vec![OrderHistoryEntry {
                status: OrderStatus::Pending,
                message: Some("order placed".to_string()),
                actor: Actor::Customer {
                    id: request.user_id.clone(),
                },
                auto_derived: false,
                at: now,
            }],
            version: 1,
            created_at: now,
            updated_at: now,
        };
        order.recalculate_totals();

        // Authoritative reservation. Keep probing after a failed line so the
        // Conflict names every unreservable item at once; the transaction is
        // dropped on any shortage, taking the successful deducts with it.
        let mut shortages: Vec<StockShortage> = Vec::new();
        for line in &lines {
            match self
                .stock
                .deduct_in_txn(&txn, &line.product_id, &line.variant_sku, line.qty, &order.id)
            {
                Ok(_) => {}
                Err(CoreError::InsufficientStock(mut s)) => shortages.append(&mut s),
                Err(other) => return Err(other),
            }
        }
        if !shortages.is_empty() {
            return Err(CoreError::InsufficientStock(shortages));
        }

        let mut remaining = cart;
        remaining.items.retain(|item| {
            !request.selection.iter().any(|sel| {
                sel.product_id == item.product_id && sel.variant_sku == item.variant_sku
            })
        });
        remaining.updated_at = now;
        self.storage.put_cart_txn(&txn, &remaining)?;
        self.storage.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            items = order.items.len(),
            total_price = order.total_price,
            "checkout committed"
        );
        self.notify_confirmed(order.clone());

        Ok(CheckoutReceipt {
            order_id,
            order_number: order.order_number,
            status: order.status,
            total_price: order.total_price,
        })
    }

    /// Resolve each selected cart line to its effective variant, with the
    /// advisory availability check.
    fn resolve_lines(
        &self,
        txn: &redb::WriteTransaction,
        cart: &Cart,
        selection: &[CartSelection],
    ) -> CoreResult<Vec<ResolvedLine>> {
        let mut lines: Vec<ResolvedLine> = Vec::new();
        let mut shortages: Vec<StockShortage> = Vec::new();

        for sel in selection {
            let cart_item = cart
                .items
                .iter()
                .find(|i| i.product_id == sel.product_id && i.variant_sku == sel.variant_sku)
                .ok_or_else(|| {
                    CoreError::not_found(format!(
                        "cart has no line for product {}",
                        sel.product_id
                    ))
                })?;
            if cart_item.qty <= 0 {
                return Err(CoreError::invalid_argument(format!(
                    "cart line for product {} has non-positive quantity",
                    sel.product_id
                )));
            }

            let product = self
                .storage
                .get_product_txn(txn, &sel.product_id)?
                .ok_or_else(|| {
                    CoreError::not_found(format!("product {} not found", sel.product_id))
                })?;
            if !product.is_active {
                return Err(CoreError::invalid_argument(format!(
                    "product {} is no longer available",
                    product.id
                )));
            }
            let variant = match &sel.variant_sku {
                Some(sku) => product.variant(sku).ok_or_else(|| {
                    CoreError::not_found(format!("variant {}/{} not found", product.id, sku))
                })?,
                None => product.default_variant().ok_or_else(|| {
                    CoreError::internal(format!("product {} has no default variant", product.id))
                })?,
            };
            if !variant.is_active {
                return Err(CoreError::invalid_argument(format!(
                    "variant {}/{} is no longer available",
                    product.id, variant.sku
                )));
            }
            if variant.stock < cart_item.qty {
                shortages.push(StockShortage {
                    product_id: product.id.clone(),
                    variant_sku: variant.sku.clone(),
                    requested: cart_item.qty,
                    available: variant.stock,
                });
                continue;
            }

            // Two selections resolving to the same variant merge into one
            // line, keeping the sale-record key unique per order
            if let Some(existing) = lines
                .iter_mut()
                .find(|l| l.product_id == product.id && l.variant_sku == variant.sku)
            {
                existing.qty += cart_item.qty;
            } else {
                lines.push(ResolvedLine {
                    product_id: product.id.clone(),
                    variant_sku: variant.sku.clone(),
                    name: format!("{} {}", product.name, variant.name),
                    qty: cart_item.qty,
                    unit_price: variant.price,
                });
            }
        }

        if !shortages.is_empty() {
            return Err(CoreError::InsufficientStock(shortages));
        }
        Ok(lines)
    }

    fn resolve_address(
        &self,
        txn: &redb::WriteTransaction,
        user_id: &str,
        shipping: &ShippingAddress,
    ) -> CoreResult<String> {
        match shipping {
            ShippingAddress::Existing { address_id } => {
                let address = self
                    .storage
                    .get_address_txn(txn, address_id)?
                    .ok_or_else(|| {
                        CoreError::not_found(format!("address {} not found", address_id))
                    })?;
                if address.user_id != user_id {
                    return Err(CoreError::invalid_argument(format!(
                        "address {} does not belong to user {}",
                        address_id, user_id
                    )));
                }
                Ok(address.id)
            }
            ShippingAddress::New(input) => {
                input
                    .validate()
                    .map_err(|e| CoreError::invalid_argument(e.to_string()))?;
                let address = Address {
                    id: new_id(),
                    user_id: user_id.to_string(),
                    recipient: input.recipient.clone(),
                    line1: input.line1.clone(),
                    line2: input.line2.clone(),
                    city: input.city.clone(),
                    postal_code: input.postal_code.clone(),
                    country: input.country.clone(),
                    phone: input.phone.clone(),
                };
                self.storage.put_address_txn(txn, &address)?;
                Ok(address.id)
            }
        }
    }

    /// Best-effort, outside the transaction. Requires a running tokio
    /// runtime; without one (tests, shutdown) the notification is skipped.
    fn notify_confirmed(&self, order: Order) {
        let notifier = self.notifier.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = notifier.order_confirmed(&order).await {
                    warn!(order_id = %order.id, %err, "confirmation notification failed");
                }
            });
        }
    }
}
