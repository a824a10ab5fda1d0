//! In-memory test doubles for the trading engine.
//!
//! Deterministic implementations of every collaborator trait — all state
//! lives in memory and is fully controllable and inspectable from test
//! code, with no external dependencies.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use moonlist::exchange::{Exchange, Fill, TickerQuote};
use moonlist::notify::Notifier;
use moonlist::sources::ListingSource;
use moonlist::store::PositionStore;
use moonlist::types::{Position, PositionStatus};

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// A discovery source that plays back a fixed script of discoveries, then
/// reports "nothing new" forever.
pub struct ScriptedSource {
    name: String,
    script: Mutex<VecDeque<String>>,
}

impl ScriptedSource {
    pub fn new(name: &str, discoveries: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(discoveries.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    async fn scrape(&self) -> Result<Option<String>> {
        Ok(self.script.lock().unwrap().pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory position store with the same semantics as the JSON store.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Position>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_of(&self, symbol: &str) -> Option<PositionStatus> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.symbol == symbol)
            .map(|p| p.status)
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn positions_awaiting_sale(&self) -> Result<Vec<Position>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.status == PositionStatus::AwaitingSale)
            .cloned()
            .collect())
    }

    async fn mark_completed(&self, symbol: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|p| p.symbol == symbol && p.status == PositionStatus::AwaitingSale)
            .ok_or_else(|| anyhow!("no awaiting-sale record for {symbol}"))?;
        record.status = PositionStatus::Completed;
        Ok(())
    }

    async fn is_unique(&self, symbol: &str) -> Result<bool> {
        Ok(!self
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.symbol == symbol))
    }

    async fn store_unsupported(&self, symbol: &str) -> Result<()> {
        self.records.lock().unwrap().push(Position {
            symbol: symbol.to_string(),
            purchase_price: Decimal::ZERO,
            purchase_amount: Decimal::ZERO,
            purchase_time: Utc::now(),
            timeout_time: Utc::now(),
            status: PositionStatus::Unsupported,
        });
        Ok(())
    }

    async fn store_position(
        &self,
        symbol: &str,
        price: Decimal,
        amount: Decimal,
        timeout_at: DateTime<Utc>,
    ) -> Result<()> {
        self.records.lock().unwrap().push(Position {
            symbol: symbol.to_string(),
            purchase_price: price,
            purchase_amount: amount,
            purchase_time: Utc::now(),
            timeout_time: timeout_at,
            status: PositionStatus::AwaitingSale,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeExchange
// ---------------------------------------------------------------------------

/// Exchange double with controllable prices and support, echoing orders
/// the way the real client's test mode does.
pub struct FakeExchange {
    spend: Decimal,
    prices: Mutex<HashMap<String, Decimal>>,
    unsupported: Mutex<HashSet<String>>,
    purchases: Mutex<Vec<(String, Decimal, Decimal)>>,
    sells: Mutex<Vec<(String, Decimal, Decimal)>>,
}

impl FakeExchange {
    pub fn new(spend: Decimal) -> Self {
        Self {
            spend,
            prices: Mutex::new(HashMap::new()),
            unsupported: Mutex::new(HashSet::new()),
            purchases: Mutex::new(Vec::new()),
            sells: Mutex::new(Vec::new()),
        }
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices
            .lock()
            .unwrap()
            .insert(symbol.to_string(), price);
    }

    pub fn set_unsupported(&self, symbol: &str) {
        self.unsupported.lock().unwrap().insert(symbol.to_string());
    }

    /// (symbol, price, amount) per executed purchase.
    pub fn purchases(&self) -> Vec<(String, Decimal, Decimal)> {
        self.purchases.lock().unwrap().clone()
    }

    /// (symbol, amount, price) per executed sale.
    pub fn sells(&self) -> Vec<(String, Decimal, Decimal)> {
        self.sells.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exchange for FakeExchange {
    async fn check_supported(&self, symbol: &str) -> Result<bool> {
        Ok(!self.unsupported.lock().unwrap().contains(symbol))
    }

    async fn purchase(&self, symbol: &str, last_price: Decimal) -> Result<Fill> {
        let amount = self.spend / last_price;
        self.purchases
            .lock()
            .unwrap()
            .push((symbol.to_string(), last_price, amount));
        Ok(Fill {
            price: last_price,
            amount,
        })
    }

    async fn sell(&self, symbol: &str, amount: Decimal, last_price: Decimal) -> Result<Decimal> {
        self.sells
            .lock()
            .unwrap()
            .push((symbol.to_string(), amount, last_price));
        Ok(amount)
    }

    async fn last_price(&self, symbol: &str) -> Result<Decimal> {
        self.prices
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| anyhow!("no price for {symbol}"))
    }

    async fn balance(&self, _symbol: &str) -> Result<Decimal> {
        Ok(Decimal::ZERO)
    }

    async fn list_tickers(&self) -> Result<Vec<TickerQuote>> {
        Ok(self
            .prices
            .lock()
            .unwrap()
            .iter()
            .map(|(symbol, price)| TickerQuote {
                pair: format!("{symbol}_USDT"),
                lowest_ask: price.to_string(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierEvent {
    Unsupported(String),
    Purchased(String),
    Sold(String),
    Error(String),
}

/// Notifier that records every call for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotifierEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotifierEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&NotifierEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| matches(e)).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_unsupported(&self, symbol: &str) {
        self.events
            .lock()
            .unwrap()
            .push(NotifierEvent::Unsupported(symbol.to_string()));
    }

    async fn notify_purchased(&self, symbol: &str, _price: Decimal, _amount: Decimal) {
        self.events
            .lock()
            .unwrap()
            .push(NotifierEvent::Purchased(symbol.to_string()));
    }

    async fn notify_sold(&self, symbol: &str, _amount: Decimal, _price: Decimal) {
        self.events
            .lock()
            .unwrap()
            .push(NotifierEvent::Sold(symbol.to_string()));
    }

    async fn notify_error(&self, err: &anyhow::Error) {
        self.events
            .lock()
            .unwrap()
            .push(NotifierEvent::Error(err.to_string()));
    }
}
