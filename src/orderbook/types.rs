//! Order book types and data structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Single price level in an order book.
///
/// `size` is the USD notional resting at this price (price x share size),
/// converted at parse time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLevel {
    /// Price at this level.
    pub price: Decimal,
    /// USD notional resting at this price.
    pub size: Decimal,
}

impl PriceLevel {
    /// Create a new price level.
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// Bid-side snapshot of one outcome token's book.
///
/// Invariant: `bids` is strictly decreasing in price; no two levels share a
/// price. Best bid is rank 1.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// Token ID this book represents.
    pub token_id: String,
    /// Bid levels sorted by price descending.
    pub bids: Vec<PriceLevel>,
    /// When this snapshot was taken.
    pub updated_at: OffsetDateTime,
}

impl OrderBook {
    /// Build a snapshot from unsorted levels, enforcing the ordering
    /// invariant.
    pub fn new(token_id: impl Into<String>, mut bids: Vec<PriceLevel>) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        // A repeated price is the same level reported twice; its depth is
        // still real, so merge rather than drop.
        bids.dedup_by(|a, b| {
            if a.price == b.price {
                b.size += a.size;
                true
            } else {
                false
            }
        });
        Self {
            token_id: token_id.into(),
            bids,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    /// Get the best bid price.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// USD notional at the best bid.
    pub fn best_bid_size(&self) -> Decimal {
        self.bids.first().map(|l| l.size).unwrap_or(Decimal::ZERO)
    }

    /// Total USD notional resting on the bid side.
    pub fn total_depth(&self) -> Decimal {
        self.bids.iter().map(|l| l.size).sum()
    }

    /// Check if the book has no bids at all.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    /// Compact "price:$size(cumulative)" rendering of the top `n` levels,
    /// for logs. The cumulative figure is the protection an order resting
    /// just below that level would have.
    pub fn depth_summary(&self, n: usize) -> String {
        let mut cumulative = Decimal::ZERO;
        self.bids
            .iter()
            .take(n)
            .map(|l| {
                cumulative += l.size;
                format!("{}:${}(${})", l.price, l.size, cumulative)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_level_creation() {
        let level = PriceLevel::new(dec!(0.3520), dec!(800));
        assert_eq!(level.price, dec!(0.3520));
        assert_eq!(level.size, dec!(800));
    }

    #[test]
    fn new_sorts_bids_descending() {
        let book = OrderBook::new(
            "test",
            vec![
                PriceLevel::new(dec!(0.3500), dec!(300)),
                PriceLevel::new(dec!(0.3520), dec!(800)),
                PriceLevel::new(dec!(0.3510), dec!(400)),
            ],
        );

        assert_eq!(book.best_bid(), Some(dec!(0.3520)));
        assert_eq!(book.bids[1].price, dec!(0.3510));
        assert_eq!(book.bids[2].price, dec!(0.3500));
    }

    #[test]
    fn new_merges_duplicate_prices() {
        let book = OrderBook::new(
            "test",
            vec![
                PriceLevel::new(dec!(0.3520), dec!(800)),
                PriceLevel::new(dec!(0.3520), dec!(100)),
                PriceLevel::new(dec!(0.3510), dec!(400)),
            ],
        );

        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.bids[0].size, dec!(900));
        assert_eq!(book.total_depth(), dec!(1300));
    }

    #[test]
    fn depth_and_emptiness() {
        let empty = OrderBook::new("empty", Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.best_bid(), None);
        assert_eq!(empty.total_depth(), Decimal::ZERO);

        let book = OrderBook::new(
            "test",
            vec![
                PriceLevel::new(dec!(0.3520), dec!(800)),
                PriceLevel::new(dec!(0.3510), dec!(400)),
            ],
        );
        assert_eq!(book.total_depth(), dec!(1200));
        assert_eq!(book.best_bid_size(), dec!(800));
    }

    #[test]
    fn depth_summary_caps_levels() {
        let book = OrderBook::new(
            "test",
            vec![
                PriceLevel::new(dec!(0.3520), dec!(800)),
                PriceLevel::new(dec!(0.3510), dec!(400)),
            ],
        );
        assert_eq!(book.depth_summary(1), "0.3520:$800($800)");
        assert_eq!(book.depth_summary(5), "0.3520:$800($800) 0.3510:$400($1200)");
    }
}
