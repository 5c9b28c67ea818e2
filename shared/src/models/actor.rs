//! Actor Model
//!
//! Every stock movement and status-history entry records who triggered it.
//! System-triggered operations use the explicit [`Actor::System`] sentinel
//! rather than an ambient admin ID.

use serde::{Deserialize, Serialize};

/// Who performed an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// System/customer-triggered (checkout, automatic reconciliation)
    System,
    /// Administrative staff
    Staff { id: String, name: String },
    /// The customer who owns the order
    Customer { id: String },
}

impl Actor {
    /// Short label for logs and history entries
    pub fn label(&self) -> String {
        match self {
            Actor::System => "system".to_string(),
            Actor::Staff { name, .. } => format!("staff:{}", name),
            Actor::Customer { id } => format!("customer:{}", id),
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
