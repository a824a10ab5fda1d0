//! MOONLIST — exchange new-listing trading bot.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod sources;
pub mod exchange;
pub mod prices;
pub mod store;
pub mod notify;
pub mod engine;
