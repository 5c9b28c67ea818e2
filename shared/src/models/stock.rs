//! Stock Movement Model
//!
//! Audit-grade inventory movement records. Entries are immutable and
//! append-only, linked into a SHA-256 hash chain so tampering is detectable.

use super::actor::Actor;
use super::product::StockStatus;
use serde::{Deserialize, Serialize};

/// Movement kind
///
/// `Sale` always decreases stock and always carries an `order_id`.
/// `Restock` always increases. `Adjustment` may go either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Sale,
    Restock,
    Adjustment,
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MovementKind::Sale => "sale",
            MovementKind::Restock => "restock",
            MovementKind::Adjustment => "adjustment",
        };
        write!(f, "{}", s)
    }
}

/// Immutable stock movement entry
///
/// Invariant: `stock_after - stock_before` is `-quantity` or `+quantity`,
/// consistent with `kind`; a `sale` always has `order_id = Some(..)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    /// Global append sequence (unique, increasing)
    pub id: u64,
    pub product_id: String,
    pub variant_sku: String,
    pub kind: MovementKind,
    /// Absolute delta, always > 0
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    /// Required iff `kind == Sale`; restores reference the cancelled order
    pub order_id: Option<String>,
    pub actor: Actor,
    pub note: Option<String>,
    /// Purchase cost per unit (restock only)
    pub unit_cost: Option<f64>,
    pub timestamp: i64,
    /// Hash of the previous ledger entry
    pub prev_hash: String,
    /// SHA-256 over this entry's fields + prev_hash
    pub curr_hash: String,
}

/// Movement report query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct MovementQuery {
    pub product_id: Option<String>,
    pub variant_sku: Option<String>,
    pub kind: Option<MovementKind>,
    /// Unix millis, inclusive
    pub from: Option<i64>,
    /// Unix millis, inclusive
    pub to: Option<i64>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for MovementQuery {
    fn default() -> Self {
        Self {
            product_id: None,
            variant_sku: None,
            kind: None,
            from: None,
            to: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    50
}

/// A line the checkout could not reserve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub product_id: String,
    pub variant_sku: String,
    pub requested: i64,
    pub available: i64,
}

/// Low stock alert row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub product_id: String,
    pub variant_sku: String,
    pub name: String,
    pub stock: i64,
    pub threshold: i64,
    pub status: StockStatus,
}

/// Low stock alert filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LowStockQuery {
    pub category: Option<String>,
    /// Include out-of-stock rows only
    #[serde(default)]
    pub out_of_stock_only: bool,
}

/// Ledger chain verification report
#[derive(Debug, Clone, Serialize)]
pub struct ChainVerification {
    pub total_entries: u64,
    pub chain_intact: bool,
    pub breaks: Vec<ChainBreak>,
}

/// A detected break in the movement hash chain
///
/// `Link` means an entry's `prev_hash` does not match its predecessor;
/// `Content` means an entry's fields no longer hash to its `curr_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainBreakKind {
    Link,
    Content,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainBreak {
    pub movement_id: u64,
    pub kind: ChainBreakKind,
    pub expected_hash: String,
    pub actual_hash: String,
}
