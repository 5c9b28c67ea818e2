//! Storefront Server - order fulfillment and inventory reconciliation backend
//!
//! # Architecture
//!
//! The write path is built around one rule: every multi-step mutation runs
//! inside a single redb write transaction, so the conditional stock deduct is
//! a true compare-and-decrement and an order's items, its derived status, the
//! movement ledger and the cart always change together or not at all.
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # config, state, server
//! ├── db/            # redb storage layer
//! ├── catalog/       # product storage (collaborator for the core)
//! ├── stock/         # stock ledger + operations
//! ├── sales/         # revenue attribution
//! ├── orders/        # item state machine, aggregate reducer, manager
//! ├── checkout/      # checkout orchestrator
//! ├── reports/       # low-stock alerts, movement report, sales summary
//! ├── notify/        # post-commit notification (best-effort)
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # error envelope, logger
//! ```

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod reports;
pub mod sales;
pub mod stock;
pub mod utils;

// Re-export public types
pub use core::{Config, Server, ServerState};
pub use db::StoreStorage;
pub use orders::OrderManager;
pub use utils::{AppError, AppResponse, AppResult};
pub use utils::logger::{init_logger, init_logger_with_file};
