//! Shared types for the MOONLIST bot.
//!
//! These types form the data model used across all modules: the tracked
//! position record, its status lifecycle, and the domain error enum.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A purchased-and-not-yet-sold asset tracked by the bot.
///
/// Created with status `AwaitingSale` by the purchase pipeline, moved to
/// `Completed` by the liquidation pipeline after a confirmed sale.
/// `purchase_price` and `purchase_amount` are immutable once stored; only
/// the status transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Exchange-scoped asset symbol, e.g. "PEPE".
    pub symbol: String,
    /// Unit price paid. Exactly zero is treated as corrupt data, never a
    /// valid price.
    pub purchase_price: Decimal,
    /// Quantity acquired.
    pub purchase_amount: Decimal,
    pub purchase_time: DateTime<Utc>,
    /// Time after which the position should be abandoned regardless of
    /// price. Persisted but not yet consulted by liquidation.
    pub timeout_time: DateTime<Utc>,
    pub status: PositionStatus,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} @ {} | {})",
            self.symbol, self.purchase_amount, self.purchase_price, self.status,
        )
    }
}

/// Lifecycle status of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    /// Purchased, waiting for the gain threshold to be crossed.
    AwaitingSale,
    /// Sold; terminal.
    Completed,
    /// Discovered but not tradable on the configured exchange. No purchase
    /// occurred, so records with this status carry no price or amount.
    Unsupported,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionStatus::AwaitingSale => "AWAITING_SALE",
            PositionStatus::Completed => "COMPLETED",
            PositionStatus::Unsupported => "UNSUPPORTED",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for MOONLIST.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("corrupt stored record for {symbol}: {message}")]
    CorruptRecord { symbol: String, message: String },

    #[error("exchange error ({exchange}): {message}")]
    Exchange { exchange: String, message: String },

    #[error("store error: {0}")]
    Store(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
