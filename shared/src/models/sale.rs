//! Sale Record Model
//!
//! Revenue-attribution facts. A record exists iff the matching line item has
//! reached DELIVERED; keyed by `(order_id, product_id, variant_sku)` so
//! creation is idempotent.

use serde::{Deserialize, Serialize};

/// One delivered line item's revenue attribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub order_id: String,
    pub product_id: String,
    pub variant_sku: String,
    pub qty: i64,
    pub unit_price: f64,
    pub line_total: f64,
    pub recorded_at: i64,
}

/// Aggregated sales figures for a time window
#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub record_count: u64,
    pub total_qty: i64,
    pub total_revenue: f64,
}

/// Sales summary query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesQuery {
    /// Unix millis, inclusive
    pub from: Option<i64>,
    /// Unix millis, inclusive
    pub to: Option<i64>,
}
