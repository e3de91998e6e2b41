//! Safe-price search over the bid side of a book.
//!
//! The bot never rests at the best bid: being first in the queue means being
//! the very next fill. The search walks down the book accumulating the USD
//! notional resting ahead, and quotes the first level where that cushion
//! reaches the configured protection amount.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::OrderBook;

/// Smallest price increment the exchange accepts.
pub const TICK: Decimal = dec!(0.001);

/// Tolerance for price comparisons, one tenth of a tick.
pub const PRICE_EPSILON: Decimal = dec!(0.0001);

/// Lowest price the exchange accepts; computed quotes never go below this.
pub const MIN_PRICE: Decimal = dec!(0.01);

/// A qualifying placement found by [`compute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeQuote {
    /// Price to rest at.
    pub price: Decimal,
    /// 1-based rank of the level that satisfied the protection requirement.
    pub rank: u32,
}

/// Find the shallowest bid level whose cumulative depth covers
/// `min_protection`, searching at most `max_rank` levels when a ceiling is
/// given.
///
/// Rank 1 is special: if the best bid alone is thick enough, the quote steps
/// one tick inside the spread instead of joining the best bid, keeping queue
/// priority over everything except the full best-bid depth. Deeper levels are
/// quoted at their exact price.
///
/// Returns `None` when the searched range never reaches the threshold
/// (including an empty book or a zero `max_rank`).
pub fn compute(book: &OrderBook, min_protection: Decimal, max_rank: Option<u32>) -> Option<SafeQuote> {
    let mut cumulative = Decimal::ZERO;

    for (i, level) in book.bids.iter().enumerate() {
        let rank = (i + 1) as u32;

        if let Some(ceiling) = max_rank {
            if rank > ceiling {
                return None;
            }
        }

        cumulative += level.size;

        if cumulative >= min_protection {
            let price = if rank == 1 {
                (level.price - TICK).max(MIN_PRICE)
            } else {
                level.price
            };
            return Some(SafeQuote { price, rank });
        }
    }

    None
}
