//! JSON-file-backed position store.
//!
//! The whole history lives in one JSON document, loaded at open and
//! rewritten on every mutation. Fine for the record volumes this bot
//! sees (a handful of listings a week); a database can slot in behind
//! the same trait if that ever changes.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::PositionStore;
use crate::types::{BotError, Position, PositionStatus};

/// On-disk record. Unsupported assets never had a purchase, so the
/// purchase fields are optional at the storage layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoredRecord {
    symbol: String,
    #[serde(default)]
    purchase_price: Option<Decimal>,
    #[serde(default)]
    purchase_amount: Option<Decimal>,
    #[serde(default)]
    purchase_time: Option<DateTime<Utc>>,
    #[serde(default)]
    timeout_time: Option<DateTime<Utc>>,
    status: PositionStatus,
}

pub struct JsonStore {
    path: PathBuf,
    records: Mutex<Vec<StoredRecord>>,
}

impl JsonStore {
    /// Open the store, loading existing history if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = if path.exists() {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read store file {}", path.display()))?;
            let records: Vec<StoredRecord> = serde_json::from_str(&json)
                .with_context(|| format!("failed to parse store file {}", path.display()))?;
            info!(path = %path.display(), records = records.len(), "Position history loaded");
            records
        } else {
            info!(path = %path.display(), "No position history found, starting fresh");
            Vec::new()
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn persist(&self, records: &[StoredRecord]) -> Result<()> {
        let json =
            serde_json::to_string_pretty(records).context("failed to serialise position history")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write store file {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl PositionStore for JsonStore {
    async fn positions_awaiting_sale(&self) -> Result<Vec<Position>> {
        let records = self.records.lock().unwrap();

        let mut positions = Vec::new();
        for record in records.iter().filter(|r| r.status == PositionStatus::AwaitingSale) {
            // A corrupt record must not fail the whole pass; it is simply
            // not considered for sale until someone repairs the file.
            let (Some(price), Some(amount)) = (record.purchase_price, record.purchase_amount)
            else {
                warn!(
                    symbol = %record.symbol,
                    "Awaiting-sale record is missing purchase details, skipping"
                );
                continue;
            };
            positions.push(Position {
                symbol: record.symbol.clone(),
                purchase_price: price,
                purchase_amount: amount,
                purchase_time: record.purchase_time.unwrap_or_default(),
                timeout_time: record.timeout_time.unwrap_or_default(),
                status: record.status,
            });
        }
        Ok(positions)
    }

    async fn mark_completed(&self, symbol: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();

        let record = records
            .iter_mut()
            .find(|r| r.symbol == symbol && r.status == PositionStatus::AwaitingSale)
            .ok_or_else(|| BotError::Store(format!("no awaiting-sale record for {symbol}")))?;
        record.status = PositionStatus::Completed;

        self.persist(&records)
    }

    async fn is_unique(&self, symbol: &str) -> Result<bool> {
        let records = self.records.lock().unwrap();
        Ok(!records.iter().any(|r| r.symbol == symbol))
    }

    async fn store_unsupported(&self, symbol: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.push(StoredRecord {
            symbol: symbol.to_string(),
            purchase_price: None,
            purchase_amount: None,
            purchase_time: None,
            timeout_time: None,
            status: PositionStatus::Unsupported,
        });
        self.persist(&records)
    }

    async fn store_position(
        &self,
        symbol: &str,
        price: Decimal,
        amount: Decimal,
        timeout_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.push(StoredRecord {
            symbol: symbol.to_string(),
            purchase_price: Some(price),
            purchase_amount: Some(amount),
            purchase_time: Some(Utc::now()),
            timeout_time: Some(timeout_at),
            status: PositionStatus::AwaitingSale,
        });
        self.persist(&records)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn temp_path() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("moonlist_test_store_{}.json", uuid::Uuid::new_v4()));
        p
    }

    #[tokio::test]
    async fn test_full_position_lifecycle() {
        let path = temp_path();
        let store = JsonStore::open(&path).unwrap();

        assert!(store.is_unique("MOON").await.unwrap());

        let timeout = Utc::now() + chrono::Duration::days(7);
        store
            .store_position("MOON", dec!(2), dec!(7.5), timeout)
            .await
            .unwrap();

        assert!(!store.is_unique("MOON").await.unwrap());

        let open = store.positions_awaiting_sale().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].symbol, "MOON");
        assert_eq!(open[0].purchase_price, dec!(2));
        assert_eq!(open[0].purchase_amount, dec!(7.5));

        store.mark_completed("MOON").await.unwrap();
        assert!(store.positions_awaiting_sale().await.unwrap().is_empty());
        // Completed records still block re-purchase.
        assert!(!store.is_unique("MOON").await.unwrap());

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let path = temp_path();
        {
            let store = JsonStore::open(&path).unwrap();
            store
                .store_position("MOON", dec!(2), dec!(7.5), Utc::now())
                .await
                .unwrap();
            store.store_unsupported("DUST").await.unwrap();
        }

        let store = JsonStore::open(&path).unwrap();
        assert!(!store.is_unique("MOON").await.unwrap());
        assert!(!store.is_unique("DUST").await.unwrap());
        // The unsupported record never shows up as sellable.
        let open = store.positions_awaiting_sale().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].symbol, "MOON");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_record_skipped_with_warning() {
        let path = temp_path();
        std::fs::write(
            &path,
            r#"[
                {"symbol": "BROKEN", "status": "AWAITING_SALE"},
                {"symbol": "MOON", "purchase_price": 2, "purchase_amount": 7.5,
                 "purchase_time": "2026-08-01T00:00:00Z",
                 "timeout_time": "2026-08-08T00:00:00Z",
                 "status": "AWAITING_SALE"}
            ]"#,
        )
        .unwrap();

        let store = JsonStore::open(&path).unwrap();
        let open = store.positions_awaiting_sale().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].symbol, "MOON");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_mark_completed_unknown_symbol_errors() {
        let path = temp_path();
        let store = JsonStore::open(&path).unwrap();
        let err = store.mark_completed("GHOST").await.unwrap_err();
        assert!(err.to_string().contains("no awaiting-sale record"));
    }
}
