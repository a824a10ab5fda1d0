//! Coinbase product-diff source.
//!
//! Coinbase has no announcement feed worth scraping; instead the full
//! product list is snapshotted at construction and every poll diffs
//! against the set of base currencies seen so far. A never-seen base
//! currency is a discovery and immediately joins the known set, so it is
//! reported at most once.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::ListingSource;

const SOURCE_NAME: &str = "coinbase";
const PRODUCTS_URL: &str = "https://api.exchange.coinbase.com/products";

#[derive(Debug, Deserialize)]
struct Product {
    base_currency: String,
}

pub struct Coinbase {
    http: Client,
    known: Mutex<HashSet<String>>,
}

impl Coinbase {
    /// Build the source and take the initial product snapshot. Everything
    /// listed right now is by definition not news.
    pub async fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("moonlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build coinbase http client")?;

        let source = Self {
            http,
            known: Mutex::new(HashSet::new()),
        };

        let products = source
            .fetch_products()
            .await
            .context("failed to take initial coinbase product snapshot")?;

        let mut known = source.known.lock().unwrap();
        for product in products {
            known.insert(product.base_currency);
        }
        drop(known);

        Ok(source)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let products = self
            .http
            .get(PRODUCTS_URL)
            .header("Accept", "application/json")
            .send()
            .await
            .context("coinbase products request failed")?
            .error_for_status()
            .context("coinbase products returned an error status")?
            .json()
            .await
            .context("failed to decode coinbase products response")?;
        Ok(products)
    }
}

#[async_trait]
impl ListingSource for Coinbase {
    async fn scrape(&self) -> Result<Option<String>> {
        let products = self
            .fetch_products()
            .await
            .context("failed to list coinbase products")?;

        let mut known = self.known.lock().unwrap();
        Ok(first_unseen(
            &mut known,
            products.into_iter().map(|p| p.base_currency),
        ))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

/// First base currency not yet in `known`, which it joins as a side
/// effect. At most one discovery per call; the rest surface next poll.
fn first_unseen(
    known: &mut HashSet<String>,
    base_currencies: impl IntoIterator<Item = String>,
) -> Option<String> {
    for currency in base_currencies {
        if known.insert(currency.clone()) {
            return Some(currency.to_uppercase());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
