//! Shared types for the storefront backend
//!
//! Domain models, the error taxonomy, and utility helpers used by
//! `store-server` and by any future client crate.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use serde::{Deserialize, Serialize};
