//! Per-market worker task.
//!
//! One worker per market: it owns the lifecycle monitor, runs it on the poll
//! interval, and translates tick events into logs, metrics, alerts, trade-log
//! entries, and status-endpoint snapshots. All alerting funnels through here
//! so the monitor stays free of side channels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::alert::{AlertChannel, Severity};
use crate::api::{AppState, MarketSnapshot};
use crate::market::{Exchange, Market};
use crate::metrics;
use crate::trading::TradeLog;

use super::monitor::{MonitorState, OrderLifecycleMonitor, ProtectionConfig, TickEvent};

/// Drives one market's order lifecycle until shutdown or a fatal error.
pub struct MarketWorker {
    monitor: OrderLifecycleMonitor,
    market: Market,
    poll_interval: Duration,
    alerts: AlertChannel,
    trade_log: Arc<TradeLog>,
    app_state: AppState,
    shutdown: watch::Receiver<bool>,
    fills: u64,
    adjustments: u64,
}

impl MarketWorker {
    /// Worker for one market's YES token.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exchange: Arc<dyn Exchange>,
        config: Arc<ProtectionConfig>,
        market: Market,
        poll_interval: Duration,
        alerts: AlertChannel,
        trade_log: Arc<TradeLog>,
        app_state: AppState,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let monitor = OrderLifecycleMonitor::new(
            exchange,
            config,
            market.id.clone(),
            market.yes_token_id.clone(),
        );
        Self {
            monitor,
            market,
            poll_interval,
            alerts,
            trade_log,
            app_state,
            shutdown,
            fills: 0,
            adjustments: 0,
        }
    }

    /// Run until shutdown is signalled or the monitor closes itself.
    pub async fn run(mut self) {
        info!(
            market_id = %self.market.id,
            title = %self.market.title,
            token_id = %self.market.yes_token_id,
            "Market worker started"
        );
        self.publish_snapshot();

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let event = self.monitor.tick().await;
                    self.handle(event).await;
                    if self.monitor.state() == MonitorState::Closed {
                        break;
                    }
                }
                _ = self.shutdown.changed() => {
                    info!(market_id = %self.market.id, "Shutdown signalled");
                    if let Err(e) = self.monitor.close().await {
                        warn!(market_id = %self.market.id, error = %e, "Failed to cancel order on shutdown");
                        self.alerts
                            .send(
                                Severity::Warning,
                                &format!(
                                    "[{}] failed to cancel resting order on shutdown: {}",
                                    self.market.id, e
                                ),
                            )
                            .await;
                    }
                    break;
                }
            }
        }

        self.publish_snapshot();
        info!(market_id = %self.market.id, "Market worker stopped");
    }

    async fn handle(&mut self, event: TickEvent) {
        match event {
            TickEvent::Idle => {}
            TickEvent::Placed { price, rank } => {
                info!(
                    market_id = %self.market.id,
                    price = %price,
                    rank,
                    "Order placed"
                );
                metrics::increment(metrics::ORDERS_PLACED_TOTAL);
                self.publish_snapshot();
            }
            TickEvent::Replaced {
                trigger,
                old_price,
                new_price,
                new_rank,
            } => {
                info!(
                    market_id = %self.market.id,
                    ?trigger,
                    old_price = %old_price,
                    new_price = %new_price,
                    new_rank,
                    "Order adjusted"
                );
                self.adjustments += 1;
                metrics::increment(metrics::ORDERS_CANCELLED_TOTAL);
                metrics::increment(metrics::ORDERS_PLACED_TOTAL);
                metrics::increment(metrics::ADJUSTMENTS_TOTAL);
                self.publish_snapshot();
            }
            TickEvent::NoSafePrice { trigger } => {
                warn!(
                    market_id = %self.market.id,
                    ?trigger,
                    "No qualifying level in the book"
                );
                metrics::increment(metrics::SAFE_PRICE_NOT_FOUND_TOTAL);
                if trigger.is_some() {
                    // The resting order is stale but stays up; worth a look.
                    self.alerts
                        .send(
                            Severity::Warning,
                            &format!(
                                "[{}] book too thin to adjust; resting order left in place",
                                self.market.id
                            ),
                        )
                        .await;
                }
            }
            TickEvent::FillDetected { record } => {
                info!(
                    market_id = %self.market.id,
                    order_id = %record.order_id,
                    filled = %record.filled_amount,
                    verdict = %record.verdict,
                    "Fill detected"
                );
                self.fills += 1;
                metrics::increment(metrics::FILLS_DETECTED_TOTAL);
                self.alerts
                    .send(
                        Severity::Info,
                        &format!(
                            "[{}] {} fill: ${} of ${} at {}",
                            self.market.id,
                            record.verdict,
                            record.filled_amount,
                            record.ordered_amount,
                            record.price
                        ),
                    )
                    .await;
                if let Err(e) = self.trade_log.append(&record).await {
                    error!(market_id = %self.market.id, error = %e, "Failed to write trade log");
                }
                self.publish_snapshot();
            }
            TickEvent::ReplaceRace { old_order_id, reason } => {
                warn!(
                    market_id = %self.market.id,
                    old_order_id = %old_order_id,
                    reason = %reason,
                    "Cancelled but could not re-place; retrying next tick"
                );
                metrics::increment(metrics::ORDERS_CANCELLED_TOTAL);
                self.alerts
                    .send(
                        Severity::Warning,
                        &format!("[{}] replacement failed after cancel: {}", self.market.id, reason),
                    )
                    .await;
                self.publish_snapshot();
            }
            TickEvent::Transient { reason, retry_after } => {
                warn!(market_id = %self.market.id, reason = %reason, ?retry_after, "Tick abandoned");
                metrics::increment(metrics::TRANSIENT_ERRORS_TOTAL);
                if let Some(seconds) = retry_after {
                    // Honor the rate-limit hint, capped so a bad value can't
                    // park the worker.
                    tokio::time::sleep(Duration::from_secs(seconds.min(60))).await;
                }
            }
            TickEvent::Fatal(reason) => {
                error!(market_id = %self.market.id, reason = %reason, "Worker stopping on fatal error");
                self.alerts
                    .send(
                        Severity::Critical,
                        &format!("[{}] worker stopped: {}", self.market.id, reason),
                    )
                    .await;
                self.publish_snapshot();
            }
        }
    }

    fn publish_snapshot(&self) {
        let state = match self.monitor.state() {
            MonitorState::Unplaced => "unplaced",
            MonitorState::Resting => "resting",
            MonitorState::PendingReplace => "pending_replace",
            MonitorState::Closed => "closed",
        };
        let order = self.monitor.order();

        self.app_state.markets.insert(
            self.market.id.clone(),
            MarketSnapshot {
                market_id: self.market.id.clone(),
                title: self.market.title.clone(),
                state: state.to_string(),
                price: order.map(|o| o.price),
                rank: order.map(|o| o.rank),
                order_id: order.map(|o| o.order_id.clone()),
                fills: self.fills,
                adjustments: self.adjustments,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockExchange;
    use rust_decimal_macros::dec;

    fn test_market() -> Market {
        Market {
            id: "4306".to_string(),
            title: "Will it rain?".to_string(),
            yes_token_id: "tok-yes".to_string(),
        }
    }

    fn test_worker(
        exchange: Arc<MockExchange>,
        shutdown: watch::Receiver<bool>,
        trade_log: Arc<TradeLog>,
        app_state: AppState,
    ) -> MarketWorker {
        MarketWorker::new(
            exchange,
            Arc::new(ProtectionConfig {
                min_protection_amount: dec!(500),
                check_bid_position: 10,
                order_size_usd: dec!(50),
            }),
            test_market(),
            Duration::from_millis(10),
            AlertChannel::disabled(),
            trade_log,
            app_state,
            shutdown,
        )
    }

    #[tokio::test]
    async fn worker_places_then_cancels_on_shutdown() {
        let exchange = Arc::new(MockExchange::new());
        exchange.set_book(
            "tok-yes",
            &[(dec!(0.3520), dec!(800)), (dec!(0.3510), dec!(400))],
        );

        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(TradeLog::new(
            dir.path().join("fills.jsonl").to_string_lossy().to_string(),
        ));
        let app_state = AppState::new();
        let (tx, rx) = watch::channel(false);

        let worker = test_worker(exchange.clone(), rx, log, app_state.clone());
        let handle = tokio::spawn(worker.run());

        // Give the worker a few ticks to place.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(exchange.placed_count(), 1);

        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(exchange.canceled.lock().unwrap().len(), 1);
        let snapshot = app_state.markets.get("4306").unwrap();
        assert_eq!(snapshot.state, "closed");
    }

    #[tokio::test]
    async fn worker_stops_itself_on_fatal_error() {
        let exchange = Arc::new(MockExchange::new());
        exchange.set_book(
            "tok-yes",
            &[(dec!(0.3520), dec!(800)), (dec!(0.3510), dec!(400))],
        );
        exchange
            .auth_fail
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(TradeLog::new(
            dir.path().join("fills.jsonl").to_string_lossy().to_string(),
        ));
        let app_state = AppState::new();
        let (_tx, rx) = watch::channel(false);

        let worker = test_worker(exchange, rx, log, app_state.clone());
        // Returns on its own, no shutdown signal needed.
        tokio::time::timeout(Duration::from_secs(2), worker.run())
            .await
            .unwrap();

        let snapshot = app_state.markets.get("4306").unwrap();
        assert_eq!(snapshot.state, "closed");
    }
}
