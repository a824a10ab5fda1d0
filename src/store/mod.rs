//! Persistence layer.
//!
//! Defines the `PositionStore` trait — the record-keeping capability the
//! engine consumes — and provides a JSON-file-backed implementation.
//!
//! The store is the sole owner of record storage and the sole authority on
//! symbol uniqueness; the engine treats it as append/update-only and never
//! deletes records.

pub mod json;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::Position;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// All positions with status `AwaitingSale`. An empty list is the
    /// normal quiet-market case.
    async fn positions_awaiting_sale(&self) -> Result<Vec<Position>>;

    /// Transition a position to `Completed` after a confirmed sale.
    async fn mark_completed(&self, symbol: &str) -> Result<()>;

    /// True when no record of any status exists for `symbol`. Discovery
    /// feeds re-surface old listings, so a duplicate here is expected.
    async fn is_unique(&self, symbol: &str) -> Result<bool>;

    /// Record a discovered asset the exchange cannot trade. No purchase
    /// occurred, so the record carries no price or amount.
    async fn store_unsupported(&self, symbol: &str) -> Result<()>;

    /// Record a fresh purchase as `AwaitingSale`.
    async fn store_position(
        &self,
        symbol: &str,
        price: Decimal,
        amount: Decimal,
        timeout_at: DateTime<Utc>,
    ) -> Result<()>;
}
