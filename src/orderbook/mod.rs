//! Order book snapshot types and the placement calculations over them.

pub mod protection;
pub mod safe_price;
pub mod types;

pub use protection::{evaluate, RankProtection};
pub use safe_price::{compute, SafeQuote, MIN_PRICE, PRICE_EPSILON, TICK};
pub use types::{OrderBook, PriceLevel};
