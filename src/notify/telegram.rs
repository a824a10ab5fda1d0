//! Telegram notifier.
//!
//! Sends plain `sendMessage` GETs to the Bot API. Every message is
//! prefixed with the configured owner handle so shared channels can tell
//! bots apart. Failures are logged and swallowed — a broken notifier must
//! never fail a trade that already happened.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, warn};

use super::Notifier;

pub struct Telegram {
    http: Client,
    token: SecretString,
    chat_id: String,
    owner: String,
    /// When true no message is sent at all (alerts disabled in config).
    no_op: bool,
}

impl Telegram {
    pub fn new(
        token: SecretString,
        chat_id: String,
        owner: String,
        no_op: bool,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("moonlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build telegram http client")?;
        Ok(Self {
            http,
            token,
            chat_id,
            owner,
            no_op,
        })
    }

    async fn send(&self, text: &str) {
        if self.no_op {
            return;
        }

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage?chat_id={}&text={}&parse_mode=Markdown",
            self.token.expose_secret(),
            self.chat_id,
            urlencoding::encode(text),
        );

        match self.http.get(&url).send().await {
            Ok(res) if !res.status().is_success() => {
                warn!(
                    status = %res.status(),
                    "Got a bad response performing notify request"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Failed to perform notify request");
            }
        }
    }
}

#[async_trait]
impl Notifier for Telegram {
    async fn notify_unsupported(&self, symbol: &str) {
        self.send(&unsupported_message(&self.owner, symbol)).await;
    }

    async fn notify_purchased(&self, symbol: &str, price: Decimal, amount: Decimal) {
        self.send(&purchased_message(&self.owner, symbol, price, amount))
            .await;
    }

    async fn notify_sold(&self, symbol: &str, amount: Decimal, price: Decimal) {
        self.send(&sold_message(&self.owner, symbol, amount, price))
            .await;
    }

    async fn notify_error(&self, err: &anyhow::Error) {
        self.send(&format!("[{}] An error occurred: {err:#}", self.owner))
            .await;
    }
}

fn unsupported_message(owner: &str, symbol: &str) -> String {
    format!("[{owner}] Wanted to buy {symbol} but it is unsupported by the exchange :(")
}

fn purchased_message(owner: &str, symbol: &str, price: Decimal, amount: Decimal) -> String {
    format!("[{owner}] Just bought {amount} of {symbol} at {price} per coin.")
}

fn sold_message(owner: &str, symbol: &str, amount: Decimal, price: Decimal) -> String {
    format!("[{owner}] Just sold {amount} of {symbol} at {price} per coin.")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
