//! Utilities
//!
//! Error envelope and logging infrastructure.

pub mod error;
pub mod logger;

pub use error::{ok, ok_with_message, AppError, AppResponse, AppResult};
