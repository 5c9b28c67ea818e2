//! Product Model

use serde::{Deserialize, Serialize};

/// Derived stock display status
///
/// Always computed from `stock` vs `low_stock_threshold`, never stored.
/// Persisting it separately is what allowed it to drift out of sync with the
/// actual counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

/// Product variant (a purchasable SKU with its own stock counter)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub sku: String,
    pub name: String,
    /// Price in currency unit
    pub price: f64,
    /// On-hand stock, never negative
    pub stock: i64,
    pub low_stock_threshold: i64,
    pub is_default: bool,
    pub is_active: bool,
}

impl Variant {
    /// Display status as a pure function of the counter
    pub fn stock_status(&self) -> StockStatus {
        if self.stock <= 0 {
            StockStatus::OutOfStock
        } else if self.stock <= self.low_stock_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Category reference (String ID)
    pub category: Option<String>,
    pub is_active: bool,
    /// Embedded variants; exactly one has `is_default = true`
    pub variants: Vec<Variant>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    pub fn variant(&self, sku: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.sku == sku)
    }

    pub fn variant_mut(&mut self, sku: &str) -> Option<&mut Variant> {
        self.variants.iter_mut().find(|v| v.sku == sku)
    }

    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants.iter().find(|v| v.is_default)
    }

    /// Aggregate stock across all variants
    pub fn total_stock(&self) -> i64 {
        self.variants.iter().map(|v| v.stock).sum()
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub variants: Vec<VariantCreate>,
}

/// Create variant payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantCreate {
    pub sku: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(stock: i64, threshold: i64) -> Variant {
        Variant {
            sku: "SKU-1".into(),
            name: "Default".into(),
            price: 10.0,
            stock,
            low_stock_threshold: threshold,
            is_default: true,
            is_active: true,
        }
    }

    #[test]
    fn stock_status_is_derived_from_counter() {
        assert_eq!(variant(0, 5).stock_status(), StockStatus::OutOfStock);
        assert_eq!(variant(3, 5).stock_status(), StockStatus::LowStock);
        assert_eq!(variant(5, 5).stock_status(), StockStatus::LowStock);
        assert_eq!(variant(6, 5).stock_status(), StockStatus::InStock);
    }

    #[test]
    fn total_stock_sums_variants() {
        let product = Product {
            id: "p1".into(),
            name: "Shirt".into(),
            description: None,
            category: None,
            is_active: true,
            variants: vec![variant(3, 1), {
                let mut v = variant(4, 1);
                v.sku = "SKU-2".into();
                v.is_default = false;
                v
            }],
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(product.total_stock(), 7);
        assert_eq!(product.default_variant().unwrap().sku, "SKU-1");
    }
}
