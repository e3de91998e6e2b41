//! End-to-end lifecycle scenarios against the mock exchange.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rust_decimal_macros::dec;

use solo_maker::maker::{
    AdjustTrigger, MonitorState, OrderLifecycleMonitor, ProtectionConfig, TickEvent,
};
use solo_maker::market::MockExchange;
use solo_maker::trading::OrderStatus;

const MARKET: &str = "4306";
const TOKEN: &str = "tok-yes";

fn protection(check_bid_position: u32) -> Arc<ProtectionConfig> {
    Arc::new(ProtectionConfig {
        min_protection_amount: dec!(500),
        check_bid_position,
        order_size_usd: dec!(50),
    })
}

fn monitor(exchange: Arc<MockExchange>, check_bid_position: u32) -> OrderLifecycleMonitor {
    OrderLifecycleMonitor::new(exchange, protection(check_bid_position), MARKET, TOKEN)
}

#[tokio::test]
async fn first_placement_respects_the_rank_ceiling() {
    let exchange = Arc::new(MockExchange::new());
    // Ten thin levels then a wall: the only qualifying level is rank 11.
    let mut levels: Vec<_> = (0..10)
        .map(|i| (dec!(0.40) - rust_decimal::Decimal::new(i, 3), dec!(40)))
        .collect();
    levels.push((dec!(0.38), dec!(5000)));
    exchange.set_book(TOKEN, &levels);

    let mut m = monitor(exchange.clone(), 10);
    let event = m.tick().await;

    // Within the ceiling nothing qualifies, so nothing is placed.
    assert!(matches!(event, TickEvent::NoSafePrice { trigger: None }));
    assert_eq!(exchange.placed_count(), 0);

    // A monitor with a deeper ceiling takes the wall at rank 11.
    let mut deep = monitor(exchange.clone(), 15);
    match deep.tick().await {
        TickEvent::Placed { price, rank } => {
            assert_eq!(price, dec!(0.38));
            assert_eq!(rank, 11);
        }
        other => panic!("expected Placed, got {:?}", other),
    }
}

#[tokio::test]
async fn rank_drift_pulls_the_order_back_into_range() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_book(
        TOKEN,
        &[(dec!(0.3470), dec!(900)), (dec!(0.3460), dec!(50))],
    );

    let mut m = monitor(exchange.clone(), 5);
    m.tick().await; // rests at 0.3460, rank 1

    // Five fresh levels stack above; the order drifts to rank 7 with ample
    // protection, so the bounded rescan fires.
    exchange.set_book(
        TOKEN,
        &[
            (dec!(0.3520), dec!(800)),
            (dec!(0.3515), dec!(50)),
            (dec!(0.3512), dec!(50)),
            (dec!(0.3511), dec!(50)),
            (dec!(0.3510), dec!(50)),
            (dec!(0.3470), dec!(900)),
            (dec!(0.3460), dec!(50)),
        ],
    );

    match m.tick().await {
        TickEvent::Replaced {
            trigger,
            old_price,
            new_price,
            new_rank,
        } => {
            assert_eq!(trigger, AdjustTrigger::RankExceeded);
            assert_eq!(old_price, dec!(0.3460));
            // Best bid alone covers $500: one tick inside the spread.
            assert_eq!(new_price, dec!(0.3510));
            assert_eq!(new_rank, 1);
        }
        other => panic!("expected Replaced, got {:?}", other),
    }

    // Exactly one cancel and two placements total: never two live orders.
    assert_eq!(exchange.canceled.lock().unwrap().len(), 1);
    assert_eq!(exchange.placed_count(), 2);
}

#[tokio::test]
async fn protection_collapse_rescans_past_the_ceiling() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_book(
        TOKEN,
        &[(dec!(0.3520), dec!(800)), (dec!(0.3510), dec!(100))],
    );

    let mut m = monitor(exchange.clone(), 3);
    m.tick().await; // rests at 0.3510 behind the $800 wall

    // The wall evaporates. The only cover now sits at rank 5, past the
    // ceiling, but the insufficient-protection rescan is unbounded.
    exchange.set_book(
        TOKEN,
        &[
            (dec!(0.3520), dec!(100)),
            (dec!(0.3515), dec!(100)),
            (dec!(0.3512), dec!(100)),
            (dec!(0.3511), dec!(100)),
            (dec!(0.3505), dec!(200)),
            (dec!(0.3500), dec!(50)),
        ],
    );

    match m.tick().await {
        TickEvent::Replaced {
            trigger,
            new_price,
            new_rank,
            ..
        } => {
            assert_eq!(trigger, AdjustTrigger::InsufficientProtection);
            assert_eq!(new_price, dec!(0.3505));
            assert_eq!(new_rank, 5);
        }
        other => panic!("expected Replaced, got {:?}", other),
    }
}

#[tokio::test]
async fn fill_raced_with_cancel_is_still_recorded() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_book(
        TOKEN,
        &[(dec!(0.3520), dec!(800)), (dec!(0.3510), dec!(100))],
    );

    let mut m = monitor(exchange.clone(), 10);
    m.tick().await;
    let order_id = m.order().unwrap().order_id.clone();

    // The order executed almost entirely, then the exchange reports it
    // canceled. Status says canceled, money says filled.
    exchange.set_order_state(&order_id, Some(OrderStatus::Canceled), dec!(119.37), dec!(120));

    match m.tick().await {
        TickEvent::FillDetected { record } => {
            assert_eq!(record.market_id, MARKET);
            assert_eq!(record.order_id, order_id);
            assert_eq!(record.filled_amount, dec!(119.37));
            assert_eq!(record.ordered_amount, dec!(120));
            assert_eq!(record.verdict, "partial");
        }
        other => panic!("expected FillDetected, got {:?}", other),
    }

    // The quote comes back on the next tick.
    assert_eq!(m.state(), MonitorState::Unplaced);
    match m.tick().await {
        TickEvent::Placed { .. } => {}
        other => panic!("expected Placed, got {:?}", other),
    }
}

#[tokio::test]
async fn full_fill_re_quotes_on_the_next_tick() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_book(
        TOKEN,
        &[(dec!(0.3520), dec!(800)), (dec!(0.3510), dec!(100))],
    );

    let mut m = monitor(exchange.clone(), 10);
    m.tick().await;
    let order_id = m.order().unwrap().order_id.clone();

    exchange.set_order_state(&order_id, Some(OrderStatus::Filled), dec!(50), dec!(50));

    match m.tick().await {
        TickEvent::FillDetected { record } => {
            assert_eq!(record.verdict, "full");
            assert_eq!(record.filled_amount, dec!(50));
        }
        other => panic!("expected FillDetected, got {:?}", other),
    }

    match m.tick().await {
        TickEvent::Placed { price, .. } => assert_eq!(price, dec!(0.3510)),
        other => panic!("expected Placed, got {:?}", other),
    }
    assert_eq!(exchange.placed_count(), 2);
}

#[tokio::test]
async fn cancel_then_failed_placement_never_fabricates_an_order() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_book(
        TOKEN,
        &[(dec!(0.3520), dec!(800)), (dec!(0.3510), dec!(100))],
    );

    let mut m = monitor(exchange.clone(), 10);
    m.tick().await;

    // Trigger a replacement, but make the new placement fail.
    exchange.set_book(
        TOKEN,
        &[
            (dec!(0.3520), dec!(100)),
            (dec!(0.3510), dec!(100)),
            (dec!(0.3500), dec!(400)),
        ],
    );
    exchange.fail_place.store(true, Ordering::SeqCst);

    match m.tick().await {
        TickEvent::ReplaceRace { old_order_id, .. } => {
            assert_eq!(old_order_id, exchange.canceled.lock().unwrap()[0]);
        }
        other => panic!("expected ReplaceRace, got {:?}", other),
    }
    assert!(m.order().is_none());
    assert_eq!(exchange.placed_count(), 1);

    // Placement succeeds next tick; still exactly one live order.
    exchange.fail_place.store(false, Ordering::SeqCst);
    match m.tick().await {
        TickEvent::Placed { price, rank } => {
            assert_eq!(price, dec!(0.3500));
            assert_eq!(rank, 3);
        }
        other => panic!("expected Placed, got {:?}", other),
    }
    assert_eq!(exchange.placed_count(), 2);
}

#[tokio::test]
async fn thin_book_never_cancels_without_a_target() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_book(
        TOKEN,
        &[(dec!(0.3520), dec!(800)), (dec!(0.3510), dec!(100))],
    );

    let mut m = monitor(exchange.clone(), 10);
    m.tick().await;

    // The whole book collapses below the threshold.
    exchange.set_book(TOKEN, &[(dec!(0.3520), dec!(50))]);

    match m.tick().await {
        TickEvent::NoSafePrice { trigger } => {
            assert_eq!(trigger, Some(AdjustTrigger::InsufficientProtection));
        }
        other => panic!("expected NoSafePrice, got {:?}", other),
    }

    // The stale order stays up rather than giving up the quote entirely.
    assert!(m.order().is_some());
    assert!(exchange.canceled.lock().unwrap().is_empty());
}
