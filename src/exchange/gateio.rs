//! Gate.io spot exchange integration.
//!
//! REST v4. Public endpoints cover the support check and price lookups;
//! order placement and balances use the signed API (HMAC-SHA512 over
//! method, path, query, body hash, and timestamp, sent as KEY/Timestamp/
//! SIGN headers).
//!
//! API docs: https://www.gate.io/docs/developers/apiv4/
//!
//! In test mode no order ever leaves the process: purchase and sell echo
//! back the requested price and derived amount unchanged.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::{debug, info};

use super::{Exchange, Fill, TickerQuote};
use crate::types::BotError;

const BASE_URL: &str = "https://api.gateio.ws";
const API_PREFIX: &str = "/api/v4";

const ACCOUNT_SPOT: &str = "spot";
const SIDE_BUY: &str = "buy";
const SIDE_SELL: &str = "sell";
const TIME_IN_FORCE_GTC: &str = "gtc";

type HmacSha512 = Hmac<Sha512>;

// ---------------------------------------------------------------------------
// API types (Gate.io JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Currency {
    #[serde(default)]
    trade_disabled: bool,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    currency_pair: String,
    #[serde(default)]
    last: String,
    #[serde(default)]
    lowest_ask: String,
    #[serde(default)]
    highest_bid: String,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    currency_pair: &'a str,
    account: &'a str,
    side: &'a str,
    time_in_force: &'a str,
    price: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    price: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct SpotAccount {
    currency: String,
    available: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GateIo {
    http: Client,
    base_url: String,
    key: String,
    secret: SecretString,
    settlement: String,
    test_mode: bool,
    /// Settlement currency committed per purchase; quantity = spend/price.
    spend: Decimal,
}

impl GateIo {
    pub fn new(
        key: String,
        secret: SecretString,
        settlement: impl Into<String>,
        spend: Decimal,
        test_mode: bool,
    ) -> Result<Self> {
        if spend <= Decimal::ZERO {
            return Err(BotError::Config(format!(
                "spend per purchase must be positive, got {spend}"
            ))
            .into());
        }

        let http = Client::builder()
            .user_agent(concat!("moonlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build gate.io http client")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            key,
            secret,
            settlement: settlement.into(),
            test_mode,
            spend,
        })
    }

    fn pair_for(&self, symbol: &str) -> String {
        format!("{}_{}", symbol.to_uppercase(), self.settlement)
    }

    /// Authentication headers for the signed API: KEY, Timestamp, SIGN.
    fn signed_headers(
        &self,
        method: &str,
        path: &str,
        query: &str,
        body: &str,
    ) -> Result<[(&'static str, String); 3]> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let body_hash = hex(&Sha512::digest(body.as_bytes()));
        let payload = format!("{method}\n{path}\n{query}\n{body_hash}\n{timestamp}");

        let mut mac = HmacSha512::new_from_slice(self.secret.expose_secret().as_bytes())
            .context("invalid gate.io api secret")?;
        mac.update(payload.as_bytes());
        let sign = hex(&mac.finalize().into_bytes());

        Ok([
            ("KEY", self.key.clone()),
            ("Timestamp", timestamp),
            ("SIGN", sign),
        ])
    }

    async fn create_order(&self, order: &OrderRequest<'_>) -> Result<OrderResponse> {
        let path = format!("{API_PREFIX}/spot/orders");
        let body = serde_json::to_string(order).context("failed to encode order")?;
        let headers = self.signed_headers("POST", &path, "", &body)?;

        let mut req = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            req = req.header(name, value);
        }

        let res = req
            .body(body)
            .send()
            .await
            .context("order request failed")?
            .error_for_status()
            .context("order rejected")?
            .json()
            .await
            .context("failed to decode order response")?;
        Ok(res)
    }

    async fn tickers(&self, pair: Option<&str>) -> Result<Vec<Ticker>> {
        let mut url = format!("{}{}/spot/tickers", self.base_url, API_PREFIX);
        if let Some(pair) = pair {
            url = format!("{url}?currency_pair={pair}");
        }
        let tickers = self
            .http
            .get(&url)
            .send()
            .await
            .context("ticker request failed")?
            .error_for_status()
            .context("ticker request returned an error status")?
            .json()
            .await
            .context("failed to decode ticker response")?;
        Ok(tickers)
    }
}

#[async_trait]
impl Exchange for GateIo {
    async fn check_supported(&self, symbol: &str) -> Result<bool> {
        let url = format!(
            "{}{}/spot/currencies/{}",
            self.base_url,
            API_PREFIX,
            symbol.to_uppercase()
        );
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .context("currency lookup failed")?;

        // A currency Gate.io has never heard of is simply not tradable.
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let currency: Currency = res
            .error_for_status()
            .context("currency lookup returned an error status")?
            .json()
            .await
            .context("failed to decode currency response")?;

        Ok(!currency.trade_disabled)
    }

    async fn purchase(&self, symbol: &str, last_price: Decimal) -> Result<Fill> {
        if last_price <= Decimal::ZERO {
            return Err(BotError::Exchange {
                exchange: "gateio".into(),
                message: format!("refusing to buy {symbol} at non-positive price {last_price}"),
            }
            .into());
        }

        let pair = self.pair_for(symbol);
        let volume = self.spend / last_price;

        if self.test_mode {
            info!(pair, "Test mode, not really trading");
            return Ok(Fill {
                price: last_price,
                amount: volume,
            });
        }

        let order = self
            .create_order(&OrderRequest {
                currency_pair: &pair,
                account: ACCOUNT_SPOT,
                side: SIDE_BUY,
                time_in_force: TIME_IN_FORCE_GTC,
                price: last_price.to_string(),
                amount: volume.to_string(),
            })
            .await
            .with_context(|| format!("failed to place buy order for {pair}"))?;

        let price = order
            .price
            .parse::<Decimal>()
            .context("unparsable fill price")?;
        let amount = order
            .amount
            .parse::<Decimal>()
            .context("unparsable fill amount")?;
        Ok(Fill { price, amount })
    }

    async fn sell(&self, symbol: &str, amount: Decimal, last_price: Decimal) -> Result<Decimal> {
        let pair = self.pair_for(symbol);

        if self.test_mode {
            info!(pair, "Test mode, not really trading");
            return Ok(amount);
        }

        // Sell whatever is actually available rather than the recorded
        // amount; fees may have shaved the balance below it.
        let available = self
            .balance(symbol)
            .await
            .with_context(|| format!("failed to get balance for {symbol}"))?;

        info!(pair, amount = %available, "About to sell");

        self.create_order(&OrderRequest {
            currency_pair: &pair,
            account: ACCOUNT_SPOT,
            side: SIDE_SELL,
            time_in_force: TIME_IN_FORCE_GTC,
            price: last_price.to_string(),
            amount: available.to_string(),
        })
        .await
        .with_context(|| format!("failed to place sell order for {pair}"))?;

        Ok(amount)
    }

    async fn last_price(&self, symbol: &str) -> Result<Decimal> {
        let pair = self.pair_for(symbol);
        let tickers = self.tickers(Some(&pair)).await?;

        let ticker = tickers
            .first()
            .ok_or_else(|| anyhow!("expected at least one ticker for {pair}, got none"))?;

        debug!(
            pair,
            last = %ticker.last,
            lowest_ask = %ticker.lowest_ask,
            highest_bid = %ticker.highest_bid,
            "Got ticker"
        );

        ticker
            .last
            .parse::<Decimal>()
            .with_context(|| format!("unparsable last price for {pair}"))
    }

    async fn balance(&self, symbol: &str) -> Result<Decimal> {
        let path = format!("{API_PREFIX}/spot/accounts");
        let headers = self.signed_headers("GET", &path, "", "")?;

        let mut req = self.http.get(format!("{}{}", self.base_url, path));
        for (name, value) in headers {
            req = req.header(name, value);
        }

        let accounts: Vec<SpotAccount> = req
            .send()
            .await
            .context("account balance request failed")?
            .error_for_status()
            .context("account balance request returned an error status")?
            .json()
            .await
            .context("failed to decode account balances")?;

        let account = accounts
            .iter()
            .find(|a| a.currency.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| anyhow!("no {symbol} balance found"))?;

        account
            .available
            .parse::<Decimal>()
            .with_context(|| format!("unparsable available balance for {symbol}"))
    }

    async fn list_tickers(&self) -> Result<Vec<TickerQuote>> {
        let tickers = self.tickers(None).await?;
        Ok(tickers
            .into_iter()
            .map(|t| TickerQuote {
                pair: t.currency_pair,
                lowest_ask: t.lowest_ask,
            })
            .collect())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn client(test_mode: bool) -> GateIo {
        GateIo::new(
            "key".into(),
            SecretString::new("secret".into()),
            "USDT",
            dec!(15),
            test_mode,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_non_positive_spend() {
        let err = GateIo::new(
            "key".into(),
            SecretString::new("secret".into()),
            "USDT",
            Decimal::ZERO,
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("spend per purchase"));
    }

    #[test]
    fn test_pair_for_uppercases_symbol() {
        assert_eq!(client(true).pair_for("moon"), "MOON_USDT");
    }

    #[tokio::test]
    async fn test_test_mode_purchase_echoes_price_and_derives_amount() {
        let fill = client(true).purchase("MOON", dec!(2)).await.unwrap();
        assert_eq!(fill.price, dec!(2));
        assert_eq!(fill.amount, dec!(7.5)); // 15 / 2
    }

    #[tokio::test]
    async fn test_test_mode_sell_echoes_amount() {
        let sold = client(true).sell("MOON", dec!(7.5), dec!(6)).await.unwrap();
        assert_eq!(sold, dec!(7.5));
    }

    #[tokio::test]
    async fn test_purchase_refuses_zero_price() {
        let err = client(true).purchase("MOON", dec!(0)).await.unwrap_err();
        assert!(err.to_string().contains("non-positive price"));
    }

    #[test]
    fn test_signed_headers_shape() {
        let headers = client(true)
            .signed_headers("POST", "/api/v4/spot/orders", "", "{}")
            .unwrap();
        assert_eq!(headers[0].0, "KEY");
        assert_eq!(headers[0].1, "key");
        assert_eq!(headers[1].0, "Timestamp");
        assert!(headers[1].1.parse::<i64>().is_ok());
        // HMAC-SHA512 → 64 bytes → 128 hex chars.
        assert_eq!(headers[2].0, "SIGN");
        assert_eq!(headers[2].1.len(), 128);
        assert!(headers[2].1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hex_encoding() {
        assert_eq!(hex(&[0x00, 0xff, 0x1a]), "00ff1a");
    }
}
