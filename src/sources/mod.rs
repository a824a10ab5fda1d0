//! Discovery sources.
//!
//! Defines the `ListingSource` trait and provides implementations for:
//! - Binance — announcement catalog poller ("will list" articles)
//! - Binance CZ — mirror of the announcement feed on the .com.cz gateway
//! - Coinbase — product-list diffing (a never-seen base currency is news)

pub mod binance;
pub mod binance_cz;
pub mod coinbase;

use anyhow::Result;
use async_trait::async_trait;

/// An external feed that reports newly listed tradable assets.
///
/// Implementations are polled on a fixed interval and must tolerate being
/// called repeatedly; any pagination or snapshot state is the source's own
/// concern. `Ok(None)` means "nothing new this call" and is the common
/// case, not a failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Poll the source once for a newly listed asset symbol.
    async fn scrape(&self) -> Result<Option<String>>;

    /// Source name for logging and attribution.
    fn name(&self) -> &str;
}

/// Extract an asset symbol from a parenthesised announcement title,
/// e.g. "Binance Will List Moonish (MOON)" → "MOON".
pub(crate) fn symbol_in_parens(title: &str) -> Option<String> {
    let start = title.find('(')? + 1;
    let end = title[start..].find(')')? + start;
    let symbol = title[start..end].trim();
    if symbol.is_empty() {
        return None;
    }
    Some(symbol.to_uppercase())
}
