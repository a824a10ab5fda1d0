//! Shared last-price cache.
//!
//! Both trading pipelines look prices up here instead of hitting the
//! exchange per decision. A background task owned by the cache refreshes
//! the full ticker list on a fixed interval; entries are therefore at most
//! one refresh interval stale. The lock guards only the map itself — it is
//! never held across network I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::exchange::Exchange;

/// Periodically-refreshed mapping from trading pair to last observed ask.
///
/// The refresh task starts immediately on construction and stops when the
/// cache is dropped (or `shutdown` is called explicitly).
pub struct PriceCache {
    exchange: Arc<dyn Exchange>,
    settlement: String,
    prices: Arc<Mutex<HashMap<String, Decimal>>>,
    refresher: JoinHandle<()>,
}

impl PriceCache {
    /// Build the cache and start its background refresh loop.
    pub fn spawn(
        exchange: Arc<dyn Exchange>,
        settlement: impl Into<String>,
        refresh_interval: Duration,
    ) -> Self {
        let settlement = settlement.into();
        let prices: Arc<Mutex<HashMap<String, Decimal>>> = Arc::new(Mutex::new(HashMap::new()));

        let refresher = tokio::spawn({
            let exchange = Arc::clone(&exchange);
            let prices = Arc::clone(&prices);
            let settlement = settlement.clone();
            async move {
                let mut ticker = tokio::time::interval(refresh_interval);
                loop {
                    ticker.tick().await;
                    refresh_once(exchange.as_ref(), &prices, &settlement).await;
                }
            }
        });

        Self {
            exchange,
            settlement,
            prices,
            refresher,
        }
    }

    /// Last known ask for `symbol`'s settlement pair.
    ///
    /// On a cache miss this falls through to a direct exchange lookup. The
    /// direct result is deliberately not written back — the next scheduled
    /// refresh populates the entry.
    pub async fn get(&self, symbol: &str) -> Result<Decimal> {
        let pair = self.pair_for(symbol);
        if let Some(price) = self.prices.lock().unwrap().get(&pair).copied() {
            return Ok(price);
        }

        debug!(pair, "price cache miss, direct lookup");
        self.exchange.last_price(symbol).await
    }

    /// Stop the background refresh task.
    pub fn shutdown(&self) {
        self.refresher.abort();
    }

    fn pair_for(&self, symbol: &str) -> String {
        format!("{}_{}", symbol.to_uppercase(), self.settlement)
    }
}

impl Drop for PriceCache {
    fn drop(&mut self) {
        self.refresher.abort();
    }
}

/// One refresh pass: fetch the full ticker list, then swap parsed entries
/// in under the lock. A failed fetch is retried next interval; a single
/// unparsable price is skipped without disturbing the other entries.
async fn refresh_once(
    exchange: &dyn Exchange,
    prices: &Mutex<HashMap<String, Decimal>>,
    settlement: &str,
) {
    let tickers = match exchange.list_tickers().await {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "Price cache refresh failed, retrying next interval");
            return;
        }
    };

    let suffix = format!("_{settlement}");
    let mut updated = 0usize;

    let mut map = prices.lock().unwrap();
    for t in tickers {
        if !t.pair.ends_with(&suffix) || t.lowest_ask.is_empty() {
            continue;
        }
        match t.lowest_ask.parse::<Decimal>() {
            Ok(price) => {
                map.insert(t.pair, price);
                updated += 1;
            }
            Err(e) => {
                warn!(
                    pair = %t.pair,
                    lowest_ask = %t.lowest_ask,
                    error = %e,
                    "Invalid ticker price, skipping entry"
                );
            }
        }
    }
    drop(map);

    debug!(entries = updated, "Price cache refreshed");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
