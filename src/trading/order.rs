//! Order types and creation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Order side. The maker strategy only ever posts bids; `Sell` exists for
/// completeness of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order.
    #[strum(serialize = "BUY", serialize = "buy")]
    Buy,
    /// Sell order.
    #[strum(serialize = "SELL", serialize = "sell")]
    Sell,
}

/// Order status as reported by the exchange.
///
/// The API is inconsistent about status encoding; numeric aliases cover the
/// variants seen in the wild. Fill decisions never rely on this alone; see
/// [`crate::maker::fill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order is pending acceptance.
    #[strum(serialize = "pending", serialize = "PENDING", serialize = "1")]
    Pending,
    /// Order is live on the book.
    #[strum(serialize = "live", serialize = "LIVE", serialize = "open", serialize = "2")]
    Live,
    /// Order is fully filled.
    #[strum(serialize = "filled", serialize = "FILLED", serialize = "3")]
    Filled,
    /// Order was cancelled.
    #[strum(
        serialize = "canceled",
        serialize = "cancelled",
        serialize = "CANCELED",
        serialize = "CANCELLED",
        serialize = "4"
    )]
    Canceled,
    /// Order was rejected.
    #[strum(serialize = "rejected", serialize = "REJECTED")]
    Rejected,
    /// Order expired.
    #[strum(serialize = "expired", serialize = "EXPIRED")]
    Expired,
}

impl OrderStatus {
    /// Check if status is terminal (won't change).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

/// Order parameters for submission.
#[derive(Debug, Clone)]
pub struct OrderParams {
    /// Token ID to trade.
    pub token_id: String,
    /// Order side.
    pub side: Side,
    /// Limit price.
    pub price: Decimal,
    /// Order size in USD.
    pub size_usd: Decimal,
}

impl OrderParams {
    /// Create a new resting bid.
    pub fn bid(token_id: impl Into<String>, price: Decimal, size_usd: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            side: Side::Buy,
            price,
            size_usd,
        }
    }

    /// Validate order parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_id.is_empty() {
            return Err("token_id is required".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err("price must be positive".to_string());
        }
        if self.size_usd <= Decimal::ZERO {
            return Err("size must be positive".to_string());
        }
        Ok(())
    }
}

/// Order state summary from a status query.
#[derive(Debug, Clone, Default)]
pub struct OrderState {
    /// Order ID.
    pub order_id: String,
    /// Raw status, if the response carried a recognizable one.
    pub status: Option<OrderStatus>,
    /// USD amount filled so far.
    pub filled_amount: Decimal,
    /// USD amount originally ordered, if reported.
    pub ordered_amount: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn order_params_creation_and_validation() {
        let bid = OrderParams::bid("token-123", dec!(0.3510), dec!(50));
        assert_eq!(bid.side, Side::Buy);
        assert!(bid.validate().is_ok());

        let no_token = OrderParams::bid("", dec!(0.3510), dec!(50));
        assert!(no_token.validate().is_err());

        let zero_price = OrderParams::bid("token", dec!(0), dec!(50));
        assert!(zero_price.validate().is_err());

        let negative_size = OrderParams::bid("token", dec!(0.3510), dec!(-50));
        assert!(negative_size.validate().is_err());
    }

    #[test]
    fn order_status_terminal() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Live.is_terminal());
    }

    #[test]
    fn status_parses_numeric_codes() {
        assert_eq!(OrderStatus::from_str("3").unwrap(), OrderStatus::Filled);
        assert_eq!(OrderStatus::from_str("4").unwrap(), OrderStatus::Canceled);
        assert_eq!(OrderStatus::from_str("filled").unwrap(), OrderStatus::Filled);
        assert_eq!(
            OrderStatus::from_str("CANCELLED").unwrap(),
            OrderStatus::Canceled
        );
        assert!(OrderStatus::from_str("bogus").is_err());
    }
}
