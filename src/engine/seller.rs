//! Liquidation pipeline.
//!
//! Each pass scans every position awaiting sale, compares its current
//! price against the purchase price, and liquidates the ones whose gain
//! has reached the configured threshold. A collaborator failure aborts the
//! rest of the pass — unprocessed positions are simply picked up again on
//! the next tick, and completed ones have already changed status.

use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::exchange::Exchange;
use crate::notify::Notifier;
use crate::prices::PriceCache;
use crate::store::PositionStore;
use crate::types::Position;

/// What one liquidation pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationSummary {
    /// Positions awaiting sale at the start of the pass.
    pub considered: usize,
    /// Positions sold and marked completed.
    pub sold: usize,
    /// Positions skipped because their stored data was unusable.
    pub skipped: usize,
}

pub struct Seller {
    store: Arc<dyn PositionStore>,
    notifier: Arc<dyn Notifier>,
    exchange: Arc<dyn Exchange>,
    prices: Arc<PriceCache>,
    /// Minimum percentage gain before selling. A gain exactly equal to the
    /// threshold sells.
    sell_threshold_pct: i64,
}

impl Seller {
    pub fn new(
        store: Arc<dyn PositionStore>,
        notifier: Arc<dyn Notifier>,
        exchange: Arc<dyn Exchange>,
        prices: Arc<PriceCache>,
        sell_threshold_pct: i64,
    ) -> Self {
        Self {
            store,
            notifier,
            exchange,
            prices,
            sell_threshold_pct,
        }
    }

    /// Run one liquidation pass over all open positions.
    pub async fn monitor_and_sell(&self) -> Result<LiquidationSummary> {
        let positions = self
            .store
            .positions_awaiting_sale()
            .await
            .context("failed to read positions from store")?;

        let mut summary = LiquidationSummary {
            considered: positions.len(),
            ..Default::default()
        };

        if positions.is_empty() {
            debug!("No positions awaiting sale");
            return Ok(summary);
        }

        for position in &positions {
            let last = self
                .prices
                .get(&position.symbol)
                .await
                .with_context(|| format!("failed to get last price for {}", position.symbol))?;

            if !self.crossed_threshold(position, last, &mut summary) {
                continue;
            }

            let sold = self
                .exchange
                .sell(&position.symbol, position.purchase_amount, last)
                .await
                .with_context(|| format!("failed to sell {}", position.symbol))?;

            self.notifier.notify_sold(&position.symbol, sold, last).await;

            self.store
                .mark_completed(&position.symbol)
                .await
                .with_context(|| {
                    format!("{} sold but could not be marked completed", position.symbol)
                })?;

            info!(
                symbol = %position.symbol,
                amount = %sold,
                purchase_price = %position.purchase_price,
                sale_price = %last,
                "Position liquidated"
            );
            summary.sold += 1;
        }

        Ok(summary)
    }

    /// Whether the position's gain has reached the sell threshold.
    /// A zero purchase price cannot yield a meaningful percentage; such
    /// positions are skipped with a warning rather than failing the pass.
    fn crossed_threshold(
        &self,
        position: &Position,
        last: Decimal,
        summary: &mut LiquidationSummary,
    ) -> bool {
        if position.purchase_price.is_zero() {
            warn!(
                symbol = %position.symbol,
                "Stored purchase price is zero, skipping position"
            );
            summary.skipped += 1;
            return false;
        }

        let gain = (last - position.purchase_price) / position.purchase_price
            * Decimal::ONE_HUNDRED;
        let crossed = gain >= Decimal::from(self.sell_threshold_pct);

        debug!(
            symbol = %position.symbol,
            purchase_price = %position.purchase_price,
            last_price = %last,
            gain_pct = %gain,
            threshold_pct = self.sell_threshold_pct,
            crossed,
            "Considered position"
        );
        crossed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
