//! MOONLIST — exchange new-listing trading bot.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the position history, wires the discovery sources, exchange,
//! price cache and notifier into the trading engine, and runs it until
//! a shutdown signal or a terminal error.

use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{error, info};

use moonlist::config::AppConfig;
use moonlist::engine::{Buyer, Seller, Trader};
use moonlist::exchange::gateio::GateIo;
use moonlist::exchange::Exchange;
use moonlist::notify::telegram::Telegram;
use moonlist::notify::Notifier;
use moonlist::prices::PriceCache;
use moonlist::sources::binance::Binance;
use moonlist::sources::binance_cz::BinanceCz;
use moonlist::sources::coinbase::Coinbase;
use moonlist::sources::ListingSource;
use moonlist::store::json::JsonStore;
use moonlist::store::PositionStore;

const BANNER: &str = r#"
 __  __  ___   ___  _  _ _    ___ ___ _____
|  \/  |/ _ \ / _ \| \| | |  |_ _/ __|_   _|
| |\/| | (_) | (_) | .` | |__ | |\__ \ | |
|_|  |_|\___/ \___/|_|\_|____|___|___/ |_|

  New-listing trading bot
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML; invalid configuration is fatal before
    // any task is scheduled.
    let cfg = AppConfig::load("config.toml")?;

    init_logging();
    println!("{BANNER}");
    info!(
        test_mode = cfg.exchange.test_mode,
        buy_interval_secs = cfg.trader.buy_interval_secs,
        sell_interval_secs = cfg.trader.sell_interval_secs,
        sell_threshold_pct = cfg.trader.sell_threshold_pct,
        spend = %cfg.exchange.spend_per_purchase,
        "MOONLIST starting up"
    );

    // -- Collaborators ----------------------------------------------------

    let store: Arc<dyn PositionStore> = Arc::new(
        JsonStore::open(&cfg.store.path).context("failed to open position history")?,
    );

    let notifier: Arc<dyn Notifier> = Arc::new(build_notifier(&cfg)?);

    let (api_key, api_secret) = if cfg.exchange.test_mode {
        // No real orders leave the process in test mode; keys are unused.
        (String::new(), SecretString::new(String::new()))
    } else {
        (
            AppConfig::resolve_env(&cfg.exchange.api_key_env)?,
            SecretString::new(AppConfig::resolve_env(&cfg.exchange.api_secret_env)?),
        )
    };

    let exchange: Arc<dyn Exchange> = Arc::new(GateIo::new(
        api_key,
        api_secret,
        cfg.exchange.settlement_currency.clone(),
        cfg.exchange.spend_per_purchase,
        cfg.exchange.test_mode,
    )?);

    let prices = Arc::new(PriceCache::spawn(
        Arc::clone(&exchange),
        cfg.exchange.settlement_currency.clone(),
        cfg.price_refresh_interval(),
    ));

    let mut sources: Vec<Arc<dyn ListingSource>> = Vec::new();
    if cfg.sources.binance.enabled {
        sources.push(Arc::new(Binance::new()?));
    }
    if cfg.sources.binance_cz.enabled {
        sources.push(Arc::new(BinanceCz::new()?));
    }
    if cfg.sources.coinbase.enabled {
        let coinbase = Coinbase::new()
            .await
            .context("failed to initialise coinbase source")?;
        sources.push(Arc::new(coinbase));
    }
    if sources.is_empty() {
        anyhow::bail!("no discovery sources enabled in config");
    }
    info!(
        sources = ?sources.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
        "Discovery sources ready"
    );

    // -- Engine -----------------------------------------------------------

    let buyer = Arc::new(Buyer::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        Arc::clone(&exchange),
        Arc::clone(&prices),
        cfg.hold_duration(),
    ));
    let seller = Arc::new(Seller::new(
        store,
        Arc::clone(&notifier),
        exchange,
        Arc::clone(&prices),
        cfg.trader.sell_threshold_pct,
    ));

    let trader = Trader::new(
        cfg.buy_interval(),
        cfg.sell_interval(),
        buyer,
        seller,
        sources,
    );

    // -- Run until ctrl-c or a terminal error -----------------------------

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received.");
            let _ = shutdown_tx.send(true);
        }
    });

    let result = trader.run(shutdown_rx).await;
    prices.shutdown();

    match result {
        Ok(()) => {
            info!("MOONLIST shut down cleanly.");
            Ok(())
        }
        Err(e) => {
            error!(error = format!("{e:#}"), "Trading stopped with an error");
            notifier.notify_error(&e).await;
            Err(e)
        }
    }
}

fn build_notifier(cfg: &AppConfig) -> Result<Telegram> {
    if !cfg.alerts.enabled {
        return Telegram::new(
            SecretString::new(String::new()),
            String::new(),
            cfg.alerts.bot_owner.clone(),
            true,
        );
    }

    let token_env = cfg
        .alerts
        .telegram_bot_token_env
        .as_deref()
        .context("alerts enabled but telegram_bot_token_env is not set")?;
    let chat_id_env = cfg
        .alerts
        .telegram_chat_id_env
        .as_deref()
        .context("alerts enabled but telegram_chat_id_env is not set")?;

    Telegram::new(
        SecretString::new(AppConfig::resolve_env(token_env)?),
        AppConfig::resolve_env(chat_id_env)?,
        cfg.alerts.bot_owner.clone(),
        false,
    )
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("moonlist=info"));

    let json_logging = std::env::var("MOONLIST_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
