//! Data models
//!
//! Shared between store-server and clients (via API).
//! All IDs are UUID strings; timestamps are Unix milliseconds.

pub mod actor;
pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod sale;
pub mod stock;

// Re-exports
pub use actor::*;
pub use address::*;
pub use cart::*;
pub use order::*;
pub use product::*;
pub use sale::*;
pub use stock::*;
