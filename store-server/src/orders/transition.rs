//! Item status state machine
//!
//! `pending → processing → shipped → delivered`, with `cancelled` reachable
//! from any non-terminal state. `delivered` and `cancelled` are terminal.
//! Every transition rule in the server routes through [`can_transition`];
//! nothing else compares statuses.

use shared::models::ItemStatus;
use shared::{CoreError, CoreResult};

/// Position in the forward lifecycle (terminal cancel has no rank)
fn rank(status: ItemStatus) -> Option<u8> {
    match status {
        ItemStatus::Pending => Some(0),
        ItemStatus::Processing => Some(1),
        ItemStatus::Shipped => Some(2),
        ItemStatus::Delivered => Some(3),
        ItemStatus::Cancelled => None,
    }
}

/// Validate a requested item transition.
///
/// Forward moves may skip intermediate states (a warehouse can ship a
/// pending item directly). Repeating the current status is rejected.
pub fn can_transition(current: ItemStatus, requested: ItemStatus) -> CoreResult<()> {
    if current.is_terminal() {
        return Err(CoreError::invalid_transition(current, requested));
    }
    if requested == current {
        return Err(CoreError::invalid_transition(current, requested));
    }
    if requested == ItemStatus::Cancelled {
        return Ok(());
    }
    match (rank(current), rank(requested)) {
        (Some(from), Some(to)) if to > from => Ok(()),
        _ => Err(CoreError::invalid_transition(current, requested)),
    }
}
