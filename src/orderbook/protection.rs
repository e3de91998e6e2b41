//! Live rank and protection for a resting order.

use rust_decimal::Decimal;

use super::safe_price::PRICE_EPSILON;
use super::types::OrderBook;

/// The current queue position of a resting order and the USD notional
/// shielding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankProtection {
    /// 1-based rank of the order's price in the live book.
    pub rank: u32,
    /// Cumulative USD notional resting at strictly better prices.
    pub protection_ahead: Decimal,
}

/// Recompute where an order resting at `own_price` sits in the live book.
///
/// Only levels strictly better than `own_price` count, so the order's own
/// resting size is never part of the protection figure. The epsilon absorbs
/// representation noise in prices coming back from the API.
pub fn evaluate(book: &OrderBook, own_price: Decimal) -> RankProtection {
    let mut rank = 1u32;
    let mut protection_ahead = Decimal::ZERO;

    for level in &book.bids {
        if level.price > own_price + PRICE_EPSILON {
            rank += 1;
            protection_ahead += level.size;
        } else {
            break;
        }
    }

    RankProtection {
        rank,
        protection_ahead,
    }
}
