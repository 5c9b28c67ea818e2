//! Cart Model

use serde::{Deserialize, Serialize};

/// Cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product reference (String ID)
    pub product_id: String,
    /// Explicit variant; `None` means the product's default variant
    pub variant_sku: Option<String>,
    pub qty: i64,
}

/// Shopping cart (one per user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub updated_at: i64,
}

impl Cart {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            items: vec![],
            updated_at: crate::util::now_millis(),
        }
    }
}

/// Which cart lines to check out: product_id plus the optional explicit SKU,
/// matching how the line is stored in the cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSelection {
    pub product_id: String,
    pub variant_sku: Option<String>,
}
