//! Passive liquidity-provision bot for prediction-market order books.
//!
//! The strategy rests a single bid per market at a depth where enough USD
//! notional sits at better prices to absorb incoming sells before ours is
//! reached. Each market runs an independent lifecycle monitor that re-reads
//! the book every tick, detects fills by executed amount rather than status,
//! and cancel-and-replaces the order when its protection erodes or its rank
//! drifts too deep.

pub mod alert;
pub mod api;
pub mod config;
pub mod error;
pub mod maker;
pub mod market;
pub mod metrics;
pub mod orderbook;
pub mod signing;
pub mod trading;
pub mod utils;

pub use config::Config;
pub use error::{BotError, Result};
