//! Exchange integrations.
//!
//! Defines the `Exchange` trait — the wire-level trading capability the
//! engine consumes — and provides the Gate.io spot implementation.

pub mod gateio;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// A filled (or simulated) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Unit price the order filled at.
    pub price: Decimal,
    /// Quantity filled.
    pub amount: Decimal,
}

/// One entry of the exchange's full ticker list.
///
/// The ask price is kept as the raw wire string: the price cache owns the
/// parse step so that one malformed entry can be skipped without touching
/// the rest of the refresh.
#[derive(Debug, Clone)]
pub struct TickerQuote {
    /// Trading pair identifier, e.g. "MOON_USDT".
    pub pair: String,
    /// Lowest ask as reported by the exchange; may be empty.
    pub lowest_ask: String,
}

/// Abstraction over a spot exchange.
///
/// Implementors provide support checks, order placement, and price
/// lookups. All prices and amounts are denominated against the configured
/// settlement currency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Whether the asset can currently be traded on this exchange.
    async fn check_supported(&self, symbol: &str) -> Result<bool>;

    /// Buy the configured spend amount's worth of `symbol` at `last_price`
    /// (quantity = spend / price). In test mode the requested price and
    /// derived quantity are echoed back without placing an order.
    async fn purchase(&self, symbol: &str, last_price: Decimal) -> Result<Fill>;

    /// Sell holdings of `symbol` at `last_price`. Returns the amount sold.
    async fn sell(&self, symbol: &str, amount: Decimal, last_price: Decimal) -> Result<Decimal>;

    /// Direct single-symbol price lookup, bypassing any cache.
    async fn last_price(&self, symbol: &str) -> Result<Decimal>;

    /// Available balance of `symbol` on the spot account.
    async fn balance(&self, symbol: &str) -> Result<Decimal>;

    /// Fetch the full ticker list. Feeds the price cache refresh.
    async fn list_tickers(&self) -> Result<Vec<TickerQuote>>;
}
