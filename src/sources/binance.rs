//! Binance announcement catalog poller.
//!
//! Polls the public CMS catalog for new-listing articles. Only the newest
//! article is considered; a title carrying the listing keyword names the
//! asset in parentheses. The page size is cycled on every call so repeated
//! polls bypass the CDN's response cache.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{symbol_in_parens, ListingSource};

const SOURCE_NAME: &str = "binance";
const CATALOG_URL: &str =
    "https://www.binance.com/bapi/composite/v1/public/cms/article/catalog/list/query";
const LISTING_KEYWORD: &str = "will list";
/// The catalog endpoint rejects page sizes of 200 and above.
const MAX_PAGE_SIZE: usize = 200;

// ---------------------------------------------------------------------------
// API response types (Binance JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    data: CatalogData,
}

#[derive(Debug, Deserialize, Default)]
struct CatalogData {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct Binance {
    http: Client,
    page_size: AtomicUsize,
}

impl Binance {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("moonlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build binance http client")?;
        Ok(Self {
            http,
            page_size: AtomicUsize::new(1),
        })
    }

    fn next_page_size(&self) -> usize {
        let mut size = self.page_size.load(Ordering::Relaxed);
        if size >= MAX_PAGE_SIZE {
            size = 1;
        }
        self.page_size.store(size + 1, Ordering::Relaxed);
        size
    }
}

#[async_trait]
impl ListingSource for Binance {
    async fn scrape(&self) -> Result<Option<String>> {
        let url = format!(
            "{CATALOG_URL}?catalogId=48&pageNo=1&pageSize={}",
            self.next_page_size()
        );

        let res: CatalogResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("binance catalog request failed")?
            .error_for_status()
            .context("binance catalog returned an error status")?
            .json()
            .await
            .context("failed to decode binance catalog response")?;

        let Some(article) = res.data.articles.first() else {
            return Ok(None);
        };

        Ok(listing_symbol(&article.title))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

/// The announced asset symbol, if the title is a listing announcement.
fn listing_symbol(title: &str) -> Option<String> {
    let lower = title.to_lowercase();
    if !lower.contains(LISTING_KEYWORD) {
        return None;
    }
    info!(title = %lower, "Listing announcement matched");
    symbol_in_parens(&lower)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
