//! Unified error types for the maker bot.

use thiserror::Error;

/// Unified error type for the maker bot.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Market-data error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Trading/order error.
    #[error("trading error: {0}")]
    Trading(#[from] TradingError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Whether this error must stop the affected market worker.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::Trading(e) if e.is_fatal())
    }
}

/// Market-data fetch and parsing errors.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Network-level failure while talking to the exchange.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The requested market does not exist or is not tradable.
    #[error("market {market_id} not found")]
    MarketNotFound {
        /// The market that could not be resolved.
        market_id: String,
    },

    /// Order book fetch failed with a non-success HTTP status.
    #[error("failed to fetch book for {token_id}: {reason}")]
    FetchFailed {
        /// The token whose book was requested.
        token_id: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to parse market data.
    #[error("failed to parse market data: {0}")]
    ParseError(String),
}

/// Trading and order execution errors.
#[derive(Error, Debug)]
pub enum TradingError {
    /// Authentication failed. Fatal for the affected worker.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limited by the API.
    #[error("rate limited: retry after {retry_after_seconds}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_seconds: u64,
    },

    /// Network-level failure while submitting a request.
    #[error("network error: {0}")]
    Network(String),

    /// Order submission failed.
    #[error("order submission failed: {0}")]
    SubmissionFailed(String),

    /// Failed to cancel order.
    #[error("failed to cancel order {order_id}: {reason}")]
    CancelFailed {
        /// Order ID that failed to cancel.
        order_id: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to get order status.
    #[error("failed to get order status for {order_id}: {reason}")]
    StatusFailed {
        /// Order ID.
        order_id: String,
        /// Reason for failure.
        reason: String,
    },

    /// Invalid order parameters.
    #[error("invalid order parameters: {0}")]
    InvalidParams(String),

    /// Signing error.
    #[error("signing error: {0}")]
    SigningError(String),
}

impl TradingError {
    /// Fatal errors stop the affected market worker; everything else is
    /// absorbed inside the tick and retried on the next schedule.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TradingError::AuthenticationFailed(_))
    }

    /// Retryable errors carry no state change; the tick is abandoned.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TradingError::RateLimited { .. } | TradingError::Network(_)
        )
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_is_fatal() {
        let err = TradingError::AuthenticationFailed("bad key".to_string());
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
        assert!(BotError::Trading(err).is_fatal());
    }

    #[test]
    fn rate_limit_is_retryable_not_fatal() {
        let err = TradingError::RateLimited {
            retry_after_seconds: 5,
        };
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn cancel_failure_is_neither_fatal_nor_retryable() {
        let err = TradingError::CancelFailed {
            order_id: "abc".to_string(),
            reason: "HTTP 400".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(!err.is_retryable());
    }
}
