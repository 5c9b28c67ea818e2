//! Order aggregate reducer
//!
//! The order-level status is a pure function of the item statuses. An order
//! is as advanced as its most-advanced active item, except that full
//! cancellation or full delivery of the active items wins as a terminal
//! signal. The check order below is a deliberate priority; reordering it
//! changes the answer for mixed orders.

use shared::models::{ItemStatus, OrderLineItem, OrderStatus};
use shared::{CoreError, CoreResult};

pub fn derive_order_status(items: &[OrderLineItem]) -> OrderStatus {
    let n = items.len();
    if n == 0 {
        return OrderStatus::Pending;
    }
    let count = |s: ItemStatus| items.iter().filter(|i| i.status == s).count();
    let cancelled = count(ItemStatus::Cancelled);
    let delivered = count(ItemStatus::Delivered);
    let shipped = count(ItemStatus::Shipped);
    let processing = count(ItemStatus::Processing);
    let pending = count(ItemStatus::Pending);

    if cancelled == n {
        OrderStatus::Cancelled
    } else if delivered > 0 && delivered + cancelled == n {
        OrderStatus::Delivered
    } else if shipped > 0 && pending == 0 && processing == 0 {
        OrderStatus::Shipped
    } else if processing > 0 {
        OrderStatus::Processing
    } else if shipped > 0 {
        OrderStatus::Shipped
    } else {
        OrderStatus::Pending
    }
}

/// Guard a directly requested order-level status against item reality.
///
/// `delivered` requires every active (non-cancelled) item to already be
/// delivered; `cancelled` requires that nothing was delivered. The other
/// statuses only need one active item that could still reach them.
/// Re-requesting the current aggregate is allowed exactly when an active
/// item still lags it (a mixed order can derive as `shipped` while a
/// pending straggler remains); with nothing left to advance it is rejected.
pub fn validate_order_status_change(
    items: &[OrderLineItem],
    current: OrderStatus,
    requested: OrderStatus,
) -> CoreResult<()> {
    if matches!(current, OrderStatus::Delivered | OrderStatus::Cancelled) {
        return Err(CoreError::invalid_transition(current, requested));
    }
    if order_rank(requested) < order_rank(current) {
        return Err(CoreError::invalid_transition(current, requested));
    }
    if requested == current && !any_item_lags(items, requested) {
        return Err(CoreError::invalid_transition(current, requested));
    }

    let active: Vec<_> = items
        .iter()
        .filter(|i| i.status != ItemStatus::Cancelled)
        .collect();
    match requested {
        OrderStatus::Delivered => {
            if active.iter().any(|i| i.status != ItemStatus::Delivered) {
                return Err(CoreError::invalid_transition(current, requested));
            }
        }
        OrderStatus::Cancelled => {
            if items.iter().any(|i| i.status == ItemStatus::Delivered) {
                return Err(CoreError::invalid_transition(current, requested));
            }
        }
        _ => {
            if active.is_empty() {
                return Err(CoreError::invalid_transition(current, requested));
            }
        }
    }
    Ok(())
}

/// Does any non-terminal item sit behind the stage `requested` names?
fn any_item_lags(items: &[OrderLineItem], requested: OrderStatus) -> bool {
    let target = match requested {
        OrderStatus::Processing => ItemStatus::Processing,
        OrderStatus::Shipped => ItemStatus::Shipped,
        // terminal aggregates have no straggler semantics
        _ => return false,
    };
    items
        .iter()
        .any(|i| !i.status.is_terminal() && item_rank(i.status) < item_rank(target))
}

fn item_rank(status: ItemStatus) -> u8 {
    match status {
        ItemStatus::Pending => 0,
        ItemStatus::Processing => 1,
        ItemStatus::Shipped => 2,
        ItemStatus::Delivered => 3,
        ItemStatus::Cancelled => 4,
    }
}

fn order_rank(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::Pending => 0,
        OrderStatus::Processing => 1,
        OrderStatus::Shipped => 2,
        OrderStatus::Delivered => 3,
        // cancellation is orthogonal to the forward lifecycle
        OrderStatus::Cancelled => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(statuses: &[ItemStatus]) -> Vec<OrderLineItem> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| OrderLineItem {
                product_id: format!("p{}", i),
                variant_sku: format!("S{}", i),
                name: format!("Item {}", i),
                qty: 1,
                unit_price: 1.0,
                line_total: 1.0,
                status: *s,
                status_history: Vec::new(),
            })
            .collect()
    }

    use ItemStatus as I;
    use OrderStatus as O;

    #[test]
    fn empty_order_is_pending() {
        assert_eq!(derive_order_status(&[]), O::Pending);
    }

    #[test]
    fn uniform_orders() {
        assert_eq!(derive_order_status(&items(&[I::Pending, I::Pending])), O::Pending);
        assert_eq!(derive_order_status(&items(&[I::Processing])), O::Processing);
        assert_eq!(derive_order_status(&items(&[I::Shipped, I::Shipped])), O::Shipped);
        assert_eq!(derive_order_status(&items(&[I::Delivered])), O::Delivered);
        assert_eq!(derive_order_status(&items(&[I::Cancelled, I::Cancelled])), O::Cancelled);
    }

    #[test]
    fn delivered_plus_cancelled_is_delivered() {
        // One delivered, one cancelled: the order completed as far as it ever will
        assert_eq!(derive_order_status(&items(&[I::Delivered, I::Cancelled])), O::Delivered);
        assert_eq!(
            derive_order_status(&items(&[I::Delivered, I::Delivered, I::Cancelled])),
            O::Delivered
        );
    }

    #[test]
    fn delivered_with_undelivered_active_items_is_not_delivered() {
        assert_eq!(
            derive_order_status(&items(&[I::Delivered, I::Shipped])),
            O::Shipped
        );
        assert_eq!(
            derive_order_status(&items(&[I::Delivered, I::Processing])),
            O::Processing
        );
    }

    #[test]
    fn shipped_requires_no_pending_or_processing() {
        assert_eq!(
            derive_order_status(&items(&[I::Shipped, I::Cancelled])),
            O::Shipped
        );
        assert_eq!(
            derive_order_status(&items(&[I::Shipped, I::Processing])),
            O::Processing
        );
        // Mixed remainder: shipped beats pending
        assert_eq!(
            derive_order_status(&items(&[I::Shipped, I::Pending])),
            O::Shipped
        );
    }

    #[test]
    fn processing_beats_pending() {
        assert_eq!(
            derive_order_status(&items(&[I::Processing, I::Pending])),
            O::Processing
        );
    }

    #[test]
    fn direct_delivered_requires_all_active_delivered() {
        let mixed = items(&[I::Delivered, I::Shipped]);
        assert!(matches!(
            validate_order_status_change(&mixed, O::Shipped, O::Delivered),
            Err(CoreError::InvalidTransition { .. })
        ));

        let done = items(&[I::Delivered, I::Cancelled]);
        assert!(validate_order_status_change(&done, O::Shipped, O::Delivered).is_ok());
    }

    #[test]
    fn direct_cancel_rejected_once_something_delivered() {
        let with_delivery = items(&[I::Delivered, I::Pending]);
        assert!(matches!(
            validate_order_status_change(&with_delivery, O::Processing, O::Cancelled),
            Err(CoreError::InvalidTransition { .. })
        ));

        let untouched = items(&[I::Pending, I::Processing]);
        assert!(validate_order_status_change(&untouched, O::Processing, O::Cancelled).is_ok());
    }

    #[test]
    fn backward_and_terminal_changes_are_invalid() {
        let all_shipped = items(&[I::Shipped, I::Shipped]);
        assert!(matches!(
            validate_order_status_change(&all_shipped, O::Shipped, O::Processing),
            Err(CoreError::InvalidTransition { .. })
        ));
        assert!(matches!(
            validate_order_status_change(&all_shipped, O::Delivered, O::Shipped),
            Err(CoreError::InvalidTransition { .. })
        ));
        assert!(matches!(
            validate_order_status_change(&all_shipped, O::Shipped, O::Shipped),
            Err(CoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn re_requesting_the_aggregate_is_allowed_while_items_lag() {
        // A shipped/pending mix derives as shipped; re-requesting shipped
        // must still be able to advance the straggler
        let straggling = items(&[I::Shipped, I::Pending]);
        assert_eq!(derive_order_status(&straggling), O::Shipped);
        assert!(validate_order_status_change(&straggling, O::Shipped, O::Shipped).is_ok());

        // A cancelled remainder does not count as lagging
        let settled = items(&[I::Shipped, I::Cancelled]);
        assert!(matches!(
            validate_order_status_change(&settled, O::Shipped, O::Shipped),
            Err(CoreError::InvalidTransition { .. })
        ));
    }
}
