//! Post-commit notifications
//!
//! Fired after the checkout transaction commits, best-effort. A failed send
//! is logged and swallowed; it never rolls back or fails the order.

use async_trait::async_trait;
use shared::models::Order;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_confirmed(&self, order: &Order) -> anyhow::Result<()>;
}

/// Default notifier: writes the confirmation to the log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_confirmed(&self, order: &Order) -> anyhow::Result<()> {
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            user_id = %order.user_id,
            total_price = order.total_price,
            "order confirmed"
        );
        Ok(())
    }
}
