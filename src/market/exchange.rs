//! Exchange access seam.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{MarketError, TradingError};
use crate::orderbook::OrderBook;
use crate::trading::order::{OrderParams, OrderState, OrderStatus};

/// Everything the order lifecycle needs from the exchange.
///
/// The live implementation is [`crate::market::client::ClobClient`]; tests
/// drive the lifecycle through [`crate::market::mock::MockExchange`].
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Fetch the current bid-side book for a token.
    async fn fetch_order_book(&self, token_id: &str) -> Result<OrderBook, MarketError>;

    /// Submit a resting limit order, returning its ID.
    async fn place_order(&self, params: &OrderParams) -> Result<String, TradingError>;

    /// Cancel a resting order.
    async fn cancel_order(&self, order_id: &str) -> Result<(), TradingError>;

    /// Fetch the current state of an order.
    async fn order_status(&self, order_id: &str) -> Result<OrderState, TradingError>;
}

/// Dry-run wrapper: real market data, simulated trading.
///
/// Book fetches pass through to the inner exchange; placements and cancels
/// are logged and acknowledged without touching the API. Simulated orders
/// report as live and never fill.
pub struct DryRunExchange {
    inner: Arc<dyn Exchange>,
    next_id: AtomicU64,
}

impl DryRunExchange {
    /// Wrap a live exchange.
    pub fn new(inner: Arc<dyn Exchange>) -> Self {
        Self {
            inner,
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Exchange for DryRunExchange {
    async fn fetch_order_book(&self, token_id: &str) -> Result<OrderBook, MarketError> {
        self.inner.fetch_order_book(token_id).await
    }

    async fn place_order(&self, params: &OrderParams) -> Result<String, TradingError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let order_id = format!("dry-run-{}", id);
        info!(
            order_id = %order_id,
            token_id = %params.token_id,
            price = %params.price,
            size = %params.size_usd,
            "DRY RUN: would place order"
        );
        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), TradingError> {
        info!(order_id = %order_id, "DRY RUN: would cancel order");
        Ok(())
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderState, TradingError> {
        Ok(OrderState {
            order_id: order_id.to_string(),
            status: Some(OrderStatus::Live),
            filled_amount: Decimal::ZERO,
            ordered_amount: None,
        })
    }
}
