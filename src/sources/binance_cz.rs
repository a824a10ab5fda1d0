//! Binance CZ announcement mirror.
//!
//! Same announcement feed as `binance`, served from the .com.cz gateway,
//! which groups articles under catalogs instead of returning a flat list.
//! Useful because the mirror sometimes publishes ahead of the CDN-cached
//! main site.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{symbol_in_parens, ListingSource};

const SOURCE_NAME: &str = "binance-cz";
const CATALOG_URL: &str =
    "https://www.binancezh.com/gateway-api/v1/public/cms/article/list/query";
const LISTING_KEYWORD: &str = "will list";
const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: ListData,
}

#[derive(Debug, Deserialize, Default)]
struct ListData {
    #[serde(default)]
    catalogs: Vec<Catalog>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
}

pub struct BinanceCz {
    http: Client,
    page_size: AtomicUsize,
}

impl BinanceCz {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("moonlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build binance-cz http client")?;
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
impl ListingSource for BinanceCz {
    async fn scrape(&self) -> Result<Option<String>> {
        let url = format!(
            "{CATALOG_URL}?catalogId=48&pageNo=1&type=1&pageSize={}",
            self.next_page_size()
        );

        let res: ListResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("binance-cz catalog request failed")?
            .error_for_status()
            .context("binance-cz catalog returned an error status")?
            .json()
            .await
            .context("failed to decode binance-cz catalog response")?;

        Ok(newest_listing(&res))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

/// Check the newest article of each catalog for a listing announcement.
fn newest_listing(res: &ListResponse) -> Option<String> {
    for catalog in &res.data.catalogs {
        let Some(article) = catalog.articles.first() else {
            continue;
        };
        let lower = article.title.to_lowercase();
        if lower.contains(LISTING_KEYWORD) {
            info!(title = %lower, "Listing announcement matched");
            return symbol_in_parens(&lower);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
