//! Fill classification from order-status snapshots.
//!
//! Cancel requests race with incoming fills, so the exchange can report
//! `canceled` for an order that partially executed before the cancel landed.
//! The filled amount is the only trustworthy signal; the raw status is never
//! consulted when deciding whether money moved.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::trading::order::OrderStatus;

/// Fills within this many dollars of the ordered amount count as full.
pub const FILL_EPSILON: Decimal = dec!(0.01);

/// Outcome of classifying an order-status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillVerdict {
    /// Nothing executed.
    NoFill,
    /// Part of the order executed.
    Partial {
        /// USD amount filled.
        amount_filled: Decimal,
    },
    /// The whole order (within [`FILL_EPSILON`]) executed.
    Full {
        /// USD amount filled.
        amount_filled: Decimal,
    },
}

impl FillVerdict {
    /// Whether any amount executed.
    pub fn is_fill(&self) -> bool {
        !matches!(self, FillVerdict::NoFill)
    }

    /// The executed amount, zero for [`FillVerdict::NoFill`].
    pub fn amount(&self) -> Decimal {
        match self {
            FillVerdict::NoFill => Decimal::ZERO,
            FillVerdict::Partial { amount_filled } | FillVerdict::Full { amount_filled } => {
                *amount_filled
            }
        }
    }
}

/// Classify a status snapshot by its filled amount.
///
/// `raw_status` is accepted for symmetry with the API response but carries no
/// weight: an order reported `canceled` with a positive fill is a fill.
pub fn classify(
    _raw_status: Option<OrderStatus>,
    filled_amount: Decimal,
    ordered_amount: Decimal,
) -> FillVerdict {
    if filled_amount <= Decimal::ZERO {
        return FillVerdict::NoFill;
    }

    if filled_amount >= ordered_amount - FILL_EPSILON {
        FillVerdict::Full {
            amount_filled: filled_amount,
        }
    } else {
        FillVerdict::Partial {
            amount_filled: filled_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canceled_with_positive_fill_is_partial() {
        // The cancel raced an incoming taker; the status lies.
        let verdict = classify(Some(OrderStatus::Canceled), dec!(119.37), dec!(120));
        assert_eq!(
            verdict,
            FillVerdict::Partial {
                amount_filled: dec!(119.37)
            }
        );
    }

    #[test]
    fn pending_with_zero_fill_is_no_fill() {
        let verdict = classify(Some(OrderStatus::Pending), dec!(0), dec!(120));
        assert_eq!(verdict, FillVerdict::NoFill);
    }

    #[test]
    fn filled_within_epsilon_is_full() {
        let verdict = classify(Some(OrderStatus::Filled), dec!(119.995), dec!(120));
        assert_eq!(
            verdict,
            FillVerdict::Full {
                amount_filled: dec!(119.995)
            }
        );
    }

    #[test]
    fn exact_fill_is_full() {
        let verdict = classify(Some(OrderStatus::Live), dec!(50), dec!(50));
        assert_eq!(
            verdict,
            FillVerdict::Full {
                amount_filled: dec!(50)
            }
        );
    }

    #[test]
    fn status_is_ignored_entirely() {
        // Same amounts, wildly different statuses, same verdict.
        let amounts = (dec!(30), dec!(120));
        for status in [
            None,
            Some(OrderStatus::Pending),
            Some(OrderStatus::Live),
            Some(OrderStatus::Filled),
            Some(OrderStatus::Canceled),
            Some(OrderStatus::Rejected),
        ] {
            assert_eq!(
                classify(status, amounts.0, amounts.1),
                FillVerdict::Partial {
                    amount_filled: dec!(30)
                }
            );
        }
    }

    #[test]
    fn negative_fill_amount_is_no_fill() {
        let verdict = classify(None, dec!(-1), dec!(120));
        assert_eq!(verdict, FillVerdict::NoFill);
    }

    #[test]
    fn verdict_accessors() {
        assert!(!FillVerdict::NoFill.is_fill());
        assert_eq!(FillVerdict::NoFill.amount(), Decimal::ZERO);
        let partial = FillVerdict::Partial {
            amount_filled: dec!(12.5),
        };
        assert!(partial.is_fill());
        assert_eq!(partial.amount(), dec!(12.5));
    }
}
