//! Outbound notifications.
//!
//! Defines the `Notifier` trait and provides the Telegram implementation.
//! All notification calls are fire-and-forget: implementations log their
//! own failures and never propagate them back into the trading pipelines.

pub mod telegram;

use async_trait::async_trait;
use rust_decimal::Decimal;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A discovered asset turned out not to be tradable.
    async fn notify_unsupported(&self, symbol: &str);

    /// A purchase completed.
    async fn notify_purchased(&self, symbol: &str, price: Decimal, amount: Decimal);

    /// A position was liquidated.
    async fn notify_sold(&self, symbol: &str, amount: Decimal, price: Decimal);

    /// A terminal error the operator should hear about. Invoked by the
    /// top-level glue, not automatically by every pipeline failure.
    async fn notify_error(&self, err: &anyhow::Error);
}
