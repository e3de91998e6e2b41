//! The order lifecycle state machine for a single market.
//!
//! Each market owns exactly one monitor, and the monitor owns at most one
//! resting order. Every tick re-reads the world (order status, then book) and
//! decides between doing nothing, placing, or atomically replacing the order.
//! Cancel and place are strictly sequential so there is never a moment with
//! two live orders in the market.

use std::sync::Arc;

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::TradingError;
use crate::market::Exchange;
use crate::orderbook::{self, OrderBook};
use crate::trading::order::OrderParams;
use crate::trading::FillRecord;

use super::fill::{self, FillVerdict};

/// Quoting parameters shared read-only across all market workers.
#[derive(Debug, Clone)]
pub struct ProtectionConfig {
    /// Minimum USD notional that must rest at better prices than ours.
    pub min_protection_amount: Decimal,
    /// Deepest rank the bounded searches may use.
    pub check_bid_position: u32,
    /// Size of each resting order in USD.
    pub order_size_usd: Decimal,
}

impl From<&Config> for ProtectionConfig {
    fn from(config: &Config) -> Self {
        Self {
            min_protection_amount: config.min_protection_amount,
            check_bid_position: config.check_bid_position,
            order_size_usd: config.order_size_usd,
        }
    }
}

/// Lifecycle state of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No order resting; a placement is attempted every tick.
    Unplaced,
    /// One order resting on the book.
    Resting,
    /// Mid-replacement: the old order is cancelled, the new one not yet live.
    PendingReplace,
    /// Stopped for good (fatal error or shutdown).
    Closed,
}

/// The one order this monitor is responsible for.
#[derive(Debug, Clone)]
pub struct ManagedOrder {
    /// Exchange order ID.
    pub order_id: String,
    /// Resting price.
    pub price: Decimal,
    /// Rank the order was placed at.
    pub rank: u32,
    /// Order size in USD.
    pub size_usd: Decimal,
    /// When the order was placed.
    pub created_at: OffsetDateTime,
}

/// Why an adjustment rescan was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustTrigger {
    /// Protection ahead dropped below the minimum. Rescan is unbounded.
    InsufficientProtection,
    /// Rank drifted past the configured ceiling. Rescan is bounded.
    RankExceeded,
}

/// What a single tick did, for the worker to log and alert on.
#[derive(Debug, Clone)]
pub enum TickEvent {
    /// Nothing needed doing.
    Idle,
    /// First placement (or re-placement after a fill or race).
    Placed {
        /// Price the order rests at.
        price: Decimal,
        /// Rank at placement time.
        rank: u32,
    },
    /// The resting order was cancelled and a new one placed.
    Replaced {
        /// Why the adjustment ran.
        trigger: AdjustTrigger,
        /// Old resting price.
        old_price: Decimal,
        /// New resting price.
        new_price: Decimal,
        /// New rank.
        new_rank: u32,
    },
    /// A rescan found no qualifying level; any resting order was left alone.
    NoSafePrice {
        /// The trigger that started the rescan, if there was a resting order.
        trigger: Option<AdjustTrigger>,
    },
    /// The resting order executed, in part or in full.
    FillDetected {
        /// The fill, ready for the trade log.
        record: FillRecord,
    },
    /// Cancel succeeded but the new placement failed; no order is resting.
    ReplaceRace {
        /// ID of the order that was cancelled.
        old_order_id: String,
        /// The placement failure.
        reason: String,
    },
    /// A recoverable failure; the tick was abandoned and will retry.
    Transient {
        /// What went wrong.
        reason: String,
        /// Backoff hint in seconds, when the exchange provided one.
        retry_after: Option<u64>,
    },
    /// An unrecoverable failure; the monitor is closed.
    Fatal(String),
}

/// Per-market order lifecycle monitor.
pub struct OrderLifecycleMonitor {
    exchange: Arc<dyn Exchange>,
    config: Arc<ProtectionConfig>,
    market_id: String,
    token_id: String,
    state: MonitorState,
    order: Option<ManagedOrder>,
}

impl OrderLifecycleMonitor {
    /// Monitor for one market's YES token, starting with no order.
    pub fn new(
        exchange: Arc<dyn Exchange>,
        config: Arc<ProtectionConfig>,
        market_id: impl Into<String>,
        token_id: impl Into<String>,
    ) -> Self {
        Self {
            exchange,
            config,
            market_id: market_id.into(),
            token_id: token_id.into(),
            state: MonitorState::Unplaced,
            order: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The resting order, if any.
    pub fn order(&self) -> Option<&ManagedOrder> {
        self.order.as_ref()
    }

    /// Market this monitor quotes.
    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    /// Run one tick: check fills, then protection and rank, then adjust.
    #[instrument(skip(self), fields(market = %self.market_id))]
    pub async fn tick(&mut self) -> TickEvent {
        if self.state == MonitorState::Closed {
            return TickEvent::Idle;
        }

        // Fill detection comes first. A fill invalidates every other
        // decision this tick could make.
        if let Some(order) = self.order.clone() {
            match self.check_fill(&order).await {
                Ok(Some(event)) => return event,
                Ok(None) => {}
                Err(e) => return self.absorb(e),
            }
        }

        let book = match self.exchange.fetch_order_book(&self.token_id).await {
            Ok(book) => book,
            Err(e) => {
                debug!(error = %e, "Book fetch failed, tick abandoned");
                return TickEvent::Transient {
                    reason: e.to_string(),
                    retry_after: None,
                };
            }
        };
        debug!(top = %book.depth_summary(10), "Book snapshot");

        match self.order.clone() {
            None => self.place_initial(&book).await,
            Some(order) => self.adjust_if_needed(&book, &order).await,
        }
    }

    /// Cancel any resting order and close the monitor.
    pub async fn close(&mut self) -> Result<(), TradingError> {
        let result = match self.order.take() {
            Some(order) => {
                info!(order_id = %order.order_id, "Cancelling resting order on shutdown");
                self.exchange.cancel_order(&order.order_id).await
            }
            None => Ok(()),
        };
        self.state = MonitorState::Closed;
        result
    }

    /// Query the resting order's status and classify any fill. Returns an
    /// event when the order is no longer ours to manage.
    async fn check_fill(&mut self, order: &ManagedOrder) -> Result<Option<TickEvent>, TradingError> {
        let state = self.exchange.order_status(&order.order_id).await?;

        let ordered = state.ordered_amount.unwrap_or(order.size_usd);
        let verdict = fill::classify(state.status, state.filled_amount, ordered);

        if verdict == FillVerdict::NoFill {
            // Gone from the book without filling (cancelled externally,
            // expired): clear it and let this tick re-place.
            if state.status.is_some_and(|s| s.is_terminal()) {
                warn!(
                    order_id = %order.order_id,
                    status = ?state.status,
                    "Resting order disappeared without filling"
                );
                self.order = None;
                self.state = MonitorState::Unplaced;
            }
            return Ok(None);
        }

        Ok(Some(self.record_fill(order, verdict, ordered)))
    }

    /// Turn a fill verdict into its event, releasing the order.
    fn record_fill(
        &mut self,
        order: &ManagedOrder,
        verdict: FillVerdict,
        ordered: Decimal,
    ) -> TickEvent {
        let verdict_name = match verdict {
            FillVerdict::Full { .. } => "full",
            _ => "partial",
        };
        let record = FillRecord::now(
            &self.market_id,
            &order.order_id,
            verdict.amount(),
            ordered,
            order.price,
            verdict_name,
        );
        self.order = None;
        self.state = MonitorState::Unplaced;
        TickEvent::FillDetected { record }
    }

    /// First placement, bounded to the configured rank ceiling.
    async fn place_initial(&mut self, book: &OrderBook) -> TickEvent {
        let quote = match orderbook::compute(
            book,
            self.config.min_protection_amount,
            Some(self.config.check_bid_position),
        ) {
            Some(quote) => quote,
            None => return TickEvent::NoSafePrice { trigger: None },
        };

        match self.place(quote.price, quote.rank).await {
            Ok(()) => TickEvent::Placed {
                price: quote.price,
                rank: quote.rank,
            },
            Err(e) => self.absorb(e),
        }
    }

    /// Evaluate the resting order against the live book and replace it when a
    /// trigger fires and a better placement exists.
    async fn adjust_if_needed(&mut self, book: &OrderBook, order: &ManagedOrder) -> TickEvent {
        let rp = orderbook::evaluate(book, order.price);

        // Insufficient protection outranks rank drift and searches the whole
        // book; rank drift stays inside the ceiling.
        let (trigger, max_rank) = if rp.protection_ahead < self.config.min_protection_amount {
            (AdjustTrigger::InsufficientProtection, None)
        } else if rp.rank > self.config.check_bid_position {
            (
                AdjustTrigger::RankExceeded,
                Some(self.config.check_bid_position),
            )
        } else {
            return TickEvent::Idle;
        };

        debug!(
            ?trigger,
            rank = rp.rank,
            protection = %rp.protection_ahead,
            price = %order.price,
            "Adjustment trigger fired"
        );

        let quote = match orderbook::compute(book, self.config.min_protection_amount, max_rank) {
            Some(quote) => quote,
            None => {
                // Nothing qualifies. The stale order stays; cancelling with
                // no replacement would just drop the quote entirely.
                return TickEvent::NoSafePrice {
                    trigger: Some(trigger),
                };
            }
        };

        // Exact comparison on purpose: Decimal carries no float noise, and
        // adjacent book levels can sit a sub-tick step apart, so any
        // tolerance here would swallow genuine replacement targets.
        if quote.price == order.price {
            return TickEvent::Idle;
        }

        self.replace(order, trigger, quote.price, quote.rank).await
    }

    /// Cancel the resting order, re-check it for a last-moment fill, then
    /// place the new one.
    async fn replace(
        &mut self,
        order: &ManagedOrder,
        trigger: AdjustTrigger,
        new_price: Decimal,
        new_rank: u32,
    ) -> TickEvent {
        self.state = MonitorState::PendingReplace;

        if let Err(e) = self.exchange.cancel_order(&order.order_id).await {
            // The old order is still (presumably) live; stay on it.
            self.state = MonitorState::Resting;
            return self.absorb(e);
        }

        // The cancel may have raced a fill. Check before placing so the fill
        // is never silently dropped. A `canceled` status here is expected and
        // means nothing; only the filled amount matters.
        match self.exchange.order_status(&order.order_id).await {
            Ok(state) => {
                let ordered = state.ordered_amount.unwrap_or(order.size_usd);
                let verdict = fill::classify(state.status, state.filled_amount, ordered);
                if verdict.is_fill() {
                    return self.record_fill(order, verdict, ordered);
                }
            }
            Err(e) => {
                warn!(error = %e, "Post-cancel status check failed; assuming no fill");
            }
        }

        let old_order_id = order.order_id.clone();
        let old_price = order.price;
        self.order = None;

        match self.place(new_price, new_rank).await {
            Ok(()) => TickEvent::Replaced {
                trigger,
                old_price,
                new_price,
                new_rank,
            },
            Err(e) if e.is_fatal() => self.absorb(e),
            Err(e) => {
                // Cancelled but could not re-place. Never fabricate an order;
                // report the gap and retry placement next tick.
                self.state = MonitorState::Unplaced;
                TickEvent::ReplaceRace {
                    old_order_id,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn place(&mut self, price: Decimal, rank: u32) -> Result<(), TradingError> {
        let params = OrderParams::bid(&self.token_id, price, self.config.order_size_usd);
        let order_id = self.exchange.place_order(&params).await?;

        self.order = Some(ManagedOrder {
            order_id,
            price,
            rank,
            size_usd: self.config.order_size_usd,
            created_at: OffsetDateTime::now_utc(),
        });
        self.state = MonitorState::Resting;
        Ok(())
    }

    /// Map a trading error to its tick event, closing the monitor on fatal
    /// ones.
    fn absorb(&mut self, error: TradingError) -> TickEvent {
        if error.is_fatal() {
            self.state = MonitorState::Closed;
            self.order = None;
            return TickEvent::Fatal(error.to_string());
        }
        let retry_after = match &error {
            TradingError::RateLimited {
                retry_after_seconds,
            } => Some(*retry_after_seconds),
            _ => None,
        };
        TickEvent::Transient {
            reason: error.to_string(),
            retry_after,
        }
    }
}
