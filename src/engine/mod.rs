//! Trading engine — the scheduler and the buy/sell decision pipelines.
//!
//! `trader` owns the long-lived tasks (one per discovery source plus one
//! for liquidation); `buyer` and `seller` are pure request/response given
//! their collaborators and hold no scheduling state of their own.

pub mod buyer;
pub mod seller;
pub mod trader;

pub use buyer::{BuyOutcome, Buyer};
pub use seller::{LiquidationSummary, Seller};
pub use trader::Trader;
