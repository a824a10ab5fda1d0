//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys, bot tokens) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::types::BotError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub trader: TraderConfig,
    pub exchange: ExchangeConfig,
    pub sources: SourcesConfig,
    pub store: StoreConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TraderConfig {
    /// How often each discovery source is polled for a buy decision.
    pub buy_interval_secs: u64,
    /// How often open positions are scanned for a sell decision.
    pub sell_interval_secs: u64,
    /// Minimum percentage gain before a position is liquidated.
    pub sell_threshold_pct: i64,
    /// Stored as the position's timeout; not yet acted on by liquidation.
    pub hold_duration_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    /// Quote currency all trading pairs and spend are denominated in.
    pub settlement_currency: String,
    /// Fixed amount of settlement currency committed per purchase.
    pub spend_per_purchase: Decimal,
    /// Refresh interval of the shared price cache.
    pub price_refresh_secs: u64,
    /// When true, purchase/sell calls echo back the requested price and
    /// amount instead of placing real orders.
    pub test_mode: bool,
    pub api_key_env: String,
    pub api_secret_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    pub binance: SourceToggle,
    pub binance_cz: SourceToggle,
    pub coinbase: SourceToggle,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceToggle {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Path of the JSON position history file.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    pub enabled: bool,
    /// Handle prefixed to every outbound message for attribution.
    pub bot_owner: String,
    pub telegram_bot_token_env: Option<String>,
    pub telegram_chat_id_env: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot safely run with.
    /// Called before any task is scheduled.
    pub fn validate(&self) -> Result<()> {
        if self.exchange.spend_per_purchase <= Decimal::ZERO {
            return Err(BotError::Config(format!(
                "spend_per_purchase must be positive, got {}",
                self.exchange.spend_per_purchase
            ))
            .into());
        }
        if self.trader.buy_interval_secs == 0 || self.trader.sell_interval_secs == 0 {
            return Err(BotError::Config(
                "buy/sell intervals must be at least one second".into(),
            )
            .into());
        }
        if self.exchange.price_refresh_secs == 0 {
            return Err(BotError::Config(
                "price_refresh_secs must be at least one second".into(),
            )
            .into());
        }
        if self.trader.sell_threshold_pct <= 0 {
            return Err(BotError::Config(format!(
                "sell_threshold_pct must be positive, got {}",
                self.trader.sell_threshold_pct
            ))
            .into());
        }
        Ok(())
    }

    pub fn buy_interval(&self) -> Duration {
        Duration::from_secs(self.trader.buy_interval_secs)
    }

    pub fn sell_interval(&self) -> Duration {
        Duration::from_secs(self.trader.sell_interval_secs)
    }

    pub fn price_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.exchange.price_refresh_secs)
    }

    pub fn hold_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.trader.hold_duration_secs as i64)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable {env_name} is not set"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> AppConfig {
        toml::from_str(
            r#"
            [trader]
            buy_interval_secs = 4
            sell_interval_secs = 30
            sell_threshold_pct = 200
            hold_duration_secs = 604800

            [exchange]
            settlement_currency = "USDT"
            spend_per_purchase = 15.0
            price_refresh_secs = 10
            test_mode = true
            api_key_env = "GATE_API_KEY"
            api_secret_env = "GATE_API_SECRET"

            [sources]
            binance = { enabled = true }
            binance_cz = { enabled = false }
            coinbase = { enabled = true }

            [store]
            path = "positions.json"

            [alerts]
            enabled = false
            bot_owner = "matt"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_and_validate() {
        let cfg = sample();
        cfg.validate().unwrap();
        assert_eq!(cfg.exchange.spend_per_purchase, dec!(15));
        assert_eq!(cfg.trader.sell_threshold_pct, 200);
        assert!(cfg.sources.binance.enabled);
        assert!(!cfg.sources.binance_cz.enabled);
        assert_eq!(cfg.buy_interval(), Duration::from_secs(4));
    }

    #[test]
    fn test_rejects_non_positive_spend() {
        let mut cfg = sample();
        cfg.exchange.spend_per_purchase = Decimal::ZERO;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("spend_per_purchase"));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut cfg = sample();
        cfg.trader.buy_interval_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let mut cfg = sample();
        cfg.trader.sell_threshold_pct = 0;
        assert!(cfg.validate().is_err());
    }
}
