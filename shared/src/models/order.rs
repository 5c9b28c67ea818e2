//! Order Model
//!
//! Orders carry a per-line-item fulfillment status; the order-level status is
//! derived from the items by the aggregate reducer and never set directly by
//! storage code.

use super::actor::Actor;
use serde::{Deserialize, Serialize};

/// Per-line-item fulfillment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl ItemStatus {
    /// Delivered and Cancelled accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Delivered | ItemStatus::Cancelled)
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Processing => "PROCESSING",
            ItemStatus::Shipped => "SHIPPED",
            ItemStatus::Delivered => "DELIVERED",
            ItemStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Order-level aggregate status (derived, see the reducer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Payment method selected at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Online,
    Card,
    Paypal,
}

/// One entry in a line item's status history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemHistoryEntry {
    pub status: ItemStatus,
    pub message: Option<String>,
    pub actor: Actor,
    pub at: i64,
}

/// One entry in the order's status history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
    pub status: OrderStatus,
    pub message: Option<String>,
    pub actor: Actor,
    /// True when the entry was produced by the aggregate reducer rather than
    /// a directly requested order-level change
    pub auto_derived: bool,
    pub at: i64,
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Product reference (String ID)
    pub product_id: String,
    pub variant_sku: String,
    pub name: String,
    pub qty: i64,
    /// Price in currency unit
    pub unit_price: f64,
    /// qty * unit_price
    pub line_total: f64,
    pub status: ItemStatus,
    pub status_history: Vec<ItemHistoryEntry>,
}

/// Order entity (aggregate root)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub items: Vec<OrderLineItem>,
    pub status: OrderStatus,
    pub total_price: f64,
    pub total_qty: i64,
    pub payment_method: PaymentMethod,
    pub paid: bool,
    pub shipping_address_id: String,
    pub status_history: Vec<OrderHistoryEntry>,
    /// Incremented on every committed mutation. Concurrent writers are
    /// serialized by the storage layer's single write transaction; the
    /// counter records mutation depth for clients and audits.
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn item(&self, index: usize) -> Option<&OrderLineItem> {
        self.items.get(index)
    }

    /// Recompute totals from the items (line totals are authoritative)
    pub fn recalculate_totals(&mut self) {
        self.total_price = self.items.iter().map(|i| i.line_total).sum();
        self.total_qty = self.items.iter().map(|i| i.qty).sum();
    }
}

/// Single item status update request (bulk path)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStatusUpdate {
    pub index: usize,
    pub status: ItemStatus,
    pub message: Option<String>,
}

/// Per-item outcome of a bulk update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub index: usize,
    pub item_status: ItemStatus,
    pub order_status: OrderStatus,
}

/// Per-item error of a bulk update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemError {
    pub index: usize,
    pub error: String,
}

/// Bulk update response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateOutcome {
    pub updated: Vec<BulkItemResult>,
    pub errors: Vec<BulkItemError>,
}
