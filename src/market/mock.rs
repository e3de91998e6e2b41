//! In-memory exchange for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{MarketError, TradingError};
use crate::orderbook::{OrderBook, PriceLevel};
use crate::trading::order::{OrderParams, OrderState, OrderStatus};

use super::exchange::Exchange;

/// Scriptable in-memory exchange.
///
/// Books are set per token; placed orders are assigned sequential IDs and
/// recorded. Failure flags flip individual operations into errors so tests
/// can exercise each recovery path.
#[derive(Debug, Default)]
pub struct MockExchange {
    books: Mutex<HashMap<String, OrderBook>>,
    states: Mutex<HashMap<String, OrderState>>,
    /// Every order ever placed, in order.
    pub placed: Mutex<Vec<OrderParams>>,
    /// Every cancel ever requested, in order.
    pub canceled: Mutex<Vec<String>>,
    next_id: AtomicU64,
    /// Fail the next book fetches with a network-ish error.
    pub fail_book: AtomicBool,
    /// Fail order placement.
    pub fail_place: AtomicBool,
    /// Fail cancels.
    pub fail_cancel: AtomicBool,
    /// Make every trading call fail authentication.
    pub auth_fail: AtomicBool,
}

impl MockExchange {
    /// Empty exchange with no books.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a bid-side book for a token. Sizes are USD notional.
    pub fn set_book(&self, token_id: &str, levels: &[(Decimal, Decimal)]) {
        let bids = levels
            .iter()
            .map(|&(price, size)| PriceLevel::new(price, size))
            .collect();
        self.books
            .lock()
            .unwrap()
            .insert(token_id.to_string(), OrderBook::new(token_id, bids));
    }

    /// Overwrite the reported state of an order, e.g. to simulate a fill.
    pub fn set_order_state(
        &self,
        order_id: &str,
        status: Option<OrderStatus>,
        filled_amount: Decimal,
        ordered_amount: Decimal,
    ) {
        self.states.lock().unwrap().insert(
            order_id.to_string(),
            OrderState {
                order_id: order_id.to_string(),
                status,
                filled_amount,
                ordered_amount: Some(ordered_amount),
            },
        );
    }

    /// Number of orders placed so far.
    pub fn placed_count(&self) -> usize {
        self.placed.lock().unwrap().len()
    }

    /// Parameters of the most recently placed order.
    pub fn last_placed(&self) -> Option<OrderParams> {
        self.placed.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Exchange for MockExchange {
    async fn fetch_order_book(&self, token_id: &str) -> Result<OrderBook, MarketError> {
        if self.fail_book.load(Ordering::SeqCst) {
            return Err(MarketError::FetchFailed {
                token_id: token_id.to_string(),
                reason: "mock outage".to_string(),
            });
        }

        self.books
            .lock()
            .unwrap()
            .get(token_id)
            .cloned()
            .ok_or_else(|| MarketError::FetchFailed {
                token_id: token_id.to_string(),
                reason: "no book installed".to_string(),
            })
    }

    async fn place_order(&self, params: &OrderParams) -> Result<String, TradingError> {
        if self.auth_fail.load(Ordering::SeqCst) {
            return Err(TradingError::AuthenticationFailed("mock".to_string()));
        }
        if self.fail_place.load(Ordering::SeqCst) {
            return Err(TradingError::SubmissionFailed("mock rejection".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let order_id = format!("mock-order-{}", id);

        self.placed.lock().unwrap().push(params.clone());
        self.states.lock().unwrap().insert(
            order_id.clone(),
            OrderState {
                order_id: order_id.clone(),
                status: Some(OrderStatus::Live),
                filled_amount: Decimal::ZERO,
                ordered_amount: Some(params.size_usd),
            },
        );

        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), TradingError> {
        if self.auth_fail.load(Ordering::SeqCst) {
            return Err(TradingError::AuthenticationFailed("mock".to_string()));
        }
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(TradingError::CancelFailed {
                order_id: order_id.to_string(),
                reason: "mock refusal".to_string(),
            });
        }

        self.canceled.lock().unwrap().push(order_id.to_string());
        if let Some(state) = self.states.lock().unwrap().get_mut(order_id) {
            if state.status == Some(OrderStatus::Live) || state.status == Some(OrderStatus::Pending)
            {
                state.status = Some(OrderStatus::Canceled);
            }
        }
        Ok(())
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderState, TradingError> {
        if self.auth_fail.load(Ordering::SeqCst) {
            return Err(TradingError::AuthenticationFailed("mock".to_string()));
        }

        self.states
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| TradingError::StatusFailed {
                order_id: order_id.to_string(),
                reason: "unknown order".to_string(),
            })
    }
}
