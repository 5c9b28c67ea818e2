//! Order lifecycle
//!
//! `transition` is the per-item state machine, `reducer` derives the
//! order-level status, `manager` ties both to storage and side effects.

pub mod manager;
pub mod reducer;
pub mod transition;

pub use manager::{CancelOutcome, ItemTransitionOutcome, OrderManager};
