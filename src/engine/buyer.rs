//! Purchase pipeline.
//!
//! One invocation takes a discovery source from "maybe something new" to a
//! recorded, announced position: scrape → dedupe against the store →
//! support check → price → purchase → persist → notify. The store's
//! uniqueness check is the sole deduplication authority — discovery feeds
//! re-surface old listings all the time, so a duplicate is a quiet
//! non-event, not an error.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::exchange::Exchange;
use crate::notify::Notifier;
use crate::prices::PriceCache;
use crate::sources::ListingSource;
use crate::store::PositionStore;

/// Outcome of a single buy consideration.
///
/// `NoNewListing` and `Unsupported` are expected terminal outcomes, never
/// surfaced as failures; anything that goes wrong between the collaborators
/// comes back as an error instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuyOutcome {
    /// Nothing new this call, or the asset was already on record.
    NoNewListing,
    /// The asset exists but cannot be traded on the configured exchange.
    Unsupported { symbol: String },
    /// A position was opened.
    Purchased {
        symbol: String,
        price: Decimal,
        amount: Decimal,
    },
}

pub struct Buyer {
    store: Arc<dyn PositionStore>,
    notifier: Arc<dyn Notifier>,
    exchange: Arc<dyn Exchange>,
    prices: Arc<PriceCache>,
    /// How long a position may be held before its stored timeout elapses.
    hold_duration: chrono::Duration,
}

impl Buyer {
    pub fn new(
        store: Arc<dyn PositionStore>,
        notifier: Arc<dyn Notifier>,
        exchange: Arc<dyn Exchange>,
        prices: Arc<PriceCache>,
        hold_duration: chrono::Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            exchange,
            prices,
            hold_duration,
        }
    }

    /// Consider one candidate from `source` and buy it if it qualifies.
    pub async fn consider(&self, source: &dyn ListingSource) -> Result<BuyOutcome> {
        let Some(symbol) = source.scrape().await.context("error scraping")? else {
            return Ok(BuyOutcome::NoNewListing);
        };

        if !self.store.is_unique(&symbol).await? {
            return Ok(BuyOutcome::NoNewListing);
        }

        info!(source = source.name(), symbol, "New listing found");

        let supported = self
            .exchange
            .check_supported(&symbol)
            .await
            .context("failed to call exchange")?;

        if !supported {
            self.notifier.notify_unsupported(&symbol).await;
            self.store
                .store_unsupported(&symbol)
                .await
                .with_context(|| format!("failed to record {symbol} as unsupported"))?;
            return Ok(BuyOutcome::Unsupported { symbol });
        }

        let last = self
            .prices
            .get(&symbol)
            .await
            .with_context(|| format!("failed to get last price for {symbol}"))?;

        let fill = self
            .exchange
            .purchase(&symbol, last)
            .await
            .with_context(|| format!("failed to purchase {symbol}"))?;

        self.store
            .store_position(&symbol, fill.price, fill.amount, Utc::now() + self.hold_duration)
            .await
            .with_context(|| format!("{symbol} purchased but details could not be stored"))?;

        self.notifier
            .notify_purchased(&symbol, fill.price, fill.amount)
            .await;

        info!(
            symbol,
            price = %fill.price,
            amount = %fill.amount,
            "Position opened"
        );

        Ok(BuyOutcome::Purchased {
            symbol,
            price: fill.price,
            amount: fill.amount,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
