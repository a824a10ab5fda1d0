//! Scheduler.
//!
//! Owns one long-lived task per discovery source (running the purchase
//! pipeline on the buy interval) plus one task running the liquidation
//! pipeline on the sell interval. Tasks park on a timer/shutdown select
//! rather than spawning per tick; a pipeline failure is logged and the
//! task carries on to its next tick. Shutdown is cooperative: an in-flight
//! pipeline invocation always finishes before the signal is observed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use super::buyer::{BuyOutcome, Buyer};
use super::seller::Seller;
use crate::sources::ListingSource;

pub struct Trader {
    buy_interval: Duration,
    sell_interval: Duration,
    buyer: Arc<Buyer>,
    seller: Arc<Seller>,
    sources: Vec<Arc<dyn ListingSource>>,
}

impl Trader {
    pub fn new(
        buy_interval: Duration,
        sell_interval: Duration,
        buyer: Arc<Buyer>,
        seller: Arc<Seller>,
        sources: Vec<Arc<dyn ListingSource>>,
    ) -> Self {
        Self {
            buy_interval,
            sell_interval,
            buyer,
            seller,
            sources,
        }
    }

    /// Run all trading tasks until `shutdown` fires, then wait for every
    /// task to exit. Returns the first task-level error, if any.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        for source in &self.sources {
            tasks.spawn(buy_task(
                Arc::clone(&self.buyer),
                Arc::clone(source),
                self.buy_interval,
                shutdown.clone(),
            ));
        }

        tasks.spawn(sell_task(
            Arc::clone(&self.seller),
            self.sell_interval,
            shutdown.clone(),
        ));

        info!(
            sources = self.sources.len(),
            buy_interval_secs = self.buy_interval.as_secs(),
            sell_interval_secs = self.sell_interval.as_secs(),
            "Trader running"
        );

        let mut first_err: Option<anyhow::Error> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(anyhow!(e).context("trading task panicked"));
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                info!("All trading tasks stopped");
                Ok(())
            }
        }
    }
}

/// Long-lived purchase loop for one discovery source. The quiet
/// no-new-listing outcome is suppressed entirely; any other error is
/// logged and the loop continues — one bad tick must not kill the source.
async fn buy_task(
    buyer: Arc<Buyer>,
    source: Arc<dyn ListingSource>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match buyer.consider(source.as_ref()).await {
                    Ok(BuyOutcome::NoNewListing) => {}
                    Ok(outcome) => {
                        info!(source = source.name(), ?outcome, "Buy pass finished");
                    }
                    Err(e) => {
                        error!(
                            source = source.name(),
                            error = format!("{e:#}"),
                            "Buy pass failed"
                        );
                    }
                }
            }
            _ = shutdown.changed() => {
                info!(source = source.name(), "Buy task stopping");
                return Ok(());
            }
        }
    }
}

/// Long-lived liquidation loop, source-agnostic: one pass covers every
/// open position regardless of which source discovered it.
async fn sell_task(
    seller: Arc<Seller>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match seller.monitor_and_sell().await {
                    Ok(summary) if summary.sold > 0 || summary.skipped > 0 => {
                        info!(
                            considered = summary.considered,
                            sold = summary.sold,
                            skipped = summary.skipped,
                            "Sell pass finished"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = format!("{e:#}"), "Sell pass failed");
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("Liquidation task stopping");
                return Ok(());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
