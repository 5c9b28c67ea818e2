//! Core error taxonomy
//!
//! Every service in `store-server` returns [`CoreError`]. The variants map
//! one-to-one onto caller-visible semantics:
//!
//! | Variant | Meaning | Retryable |
//! |---------|---------|-----------|
//! | `InvalidArgument` | malformed/missing input, no state change | no |
//! | `NotFound` | referenced entity absent | no |
//! | `Conflict` | concurrent-mutation race lost | yes |
//! | `InsufficientStock` | stock race at write time, names each shortage | yes (refresh cart) |
//! | `InvalidTransition` | state machine rule violation | no |
//! | `Internal` | unexpected/persistence failure | maybe |

use crate::models::stock::StockShortage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stock could not be reserved at write time. Carries one entry per
    /// unreservable line so the caller can tell the customer exactly which
    /// items to refresh.
    #[error("Insufficient stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<StockShortage>),

    #[error("Invalid transition: {current} -> {requested}")]
    InvalidTransition { current: String, requested: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_transition(current: impl ToString, requested: impl ToString) -> Self {
        Self::InvalidTransition {
            current: current.to_string(),
            requested: requested.to_string(),
        }
    }
}

fn format_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(|s| {
            format!(
                "{}/{} (requested {}, available {})",
                s.product_id, s.variant_sku, s.requested, s.available
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
