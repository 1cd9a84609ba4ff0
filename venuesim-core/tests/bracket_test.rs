//! Bracket and OCO integration tests.

mod common;

use common::*;
use rust_decimal_macros::dec;
use venuesim_core::domain::{ClientOrderId, Currency, Money, OrderSide, PositionId};
use venuesim_core::events::OrderEvent;
use venuesim_core::exchange::ExchangeConfig;
use venuesim_core::execution::StaticFillModel;

fn bracket_orders() -> (
    venuesim_core::domain::Order,
    venuesim_core::domain::Order,
    venuesim_core::domain::Order,
) {
    let entry = market("O-E", OrderSide::Buy, dec!(10000));
    let stop_loss = stop("O-SL", OrderSide::Sell, dec!(10000), dec!(1.0990));
    let take_profit = limit("O-TP", OrderSide::Sell, dec!(10000), dec!(1.1050));
    (entry, stop_loss, take_profit)
}

// ── Structure ────────────────────────────────────────────────────────

#[test]
fn bracket_submit_links_all_three_legs() {
    let mut h = Harness::new(StaticFillModel {
        slipped: false,
        stop_filled: false,
        limit_filled: false,
    });
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    // A resting limit entry keeps the children dormant.
    let entry = limit("O-E", OrderSide::Buy, dec!(10000), dec!(1.0995));
    let stop_loss = stop("O-SL", OrderSide::Sell, dec!(10000), dec!(1.0990));
    let take_profit = limit("O-TP", OrderSide::Sell, dec!(10000), dec!(1.1050));
    h.submit_bracket(entry, stop_loss, Some(take_profit));

    // Entry is working; children are dormant, not on the book.
    assert_eq!(h.exchange.working_orders().len(), 1);
    assert!(h
        .exchange
        .working_orders()
        .contains_key(&ClientOrderId::new("O-E")));
    assert_eq!(h.exchange.child_orders()[&ClientOrderId::new("O-E")].len(), 2);

    // All three legs were announced.
    let submitted: Vec<_> = h
        .events()
        .iter()
        .filter(|e| matches!(e, OrderEvent::Submitted(_)))
        .map(|e| e.cl_ord_id().as_str().to_string())
        .collect();
    assert_eq!(submitted, vec!["O-E", "O-SL", "O-TP"]);

    // OCO pair table is symmetric.
    let oco = h.exchange.oco_orders();
    assert_eq!(oco[&ClientOrderId::new("O-TP")], ClientOrderId::new("O-SL"));
    assert_eq!(oco[&ClientOrderId::new("O-SL")], ClientOrderId::new("O-TP"));

    // One position pre-assigned to every leg.
    let position_id = h.exchange.position_index()[&ClientOrderId::new("O-E")].clone();
    assert_eq!(position_id, PositionId::new("B-EURUSD-1"));
    assert_eq!(
        h.exchange.position_index()[&ClientOrderId::new("O-SL")],
        position_id
    );
    assert_eq!(
        h.exchange.position_index()[&ClientOrderId::new("O-TP")],
        position_id
    );
    assert_eq!(h.exchange.position_oco_orders()[&position_id].len(), 2);
}

#[test]
fn entry_fill_releases_children_into_the_book() {
    let mut h = Harness::new(StaticFillModel {
        slipped: false,
        stop_filled: false,
        limit_filled: false,
    });
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let (entry, stop_loss, take_profit) = bracket_orders();
    h.submit_bracket(entry, stop_loss, Some(take_profit));

    // Market entry fills on submission; both children go working.
    assert_eq!(h.fills().len(), 1);
    assert_eq!(h.fills()[0].cl_ord_id.as_str(), "O-E");
    assert_eq!(h.exchange.working_orders().len(), 2);
    assert!(h.exchange.child_orders().is_empty());

    let sl_events = h.events_for("O-SL");
    assert!(matches!(sl_events.last().unwrap(), OrderEvent::Working(_)));
    let tp_events = h.events_for("O-TP");
    assert!(matches!(tp_events.last().unwrap(), OrderEvent::Working(_)));
}

// ── OCO cascade ──────────────────────────────────────────────────────

#[test]
fn take_profit_fill_cancels_stop_loss_and_empties_position_group() {
    let mut h = Harness::new(StaticFillModel::optimistic());
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let (entry, stop_loss, take_profit) = bracket_orders();
    h.submit_bracket(entry, stop_loss, Some(take_profit));

    h.tick(dec!(1.1050), dec!(1.1052), t0_plus(1));

    let fills = h.fills();
    assert_eq!(fills.len(), 2);
    assert_eq!(fills[1].cl_ord_id.as_str(), "O-TP");
    assert_eq!(fills[1].avg_price, dec!(1.1050));

    let OrderEvent::Cancelled(cancelled) = h.events_for("O-SL").last().unwrap().clone() else {
        panic!("expected stop-loss cancelled");
    };
    assert_eq!(cancelled.cl_ord_id.as_str(), "O-SL");

    assert!(h.exchange.working_orders().is_empty());
    assert!(h.exchange.oco_orders().is_empty());
    assert!(h.exchange.position_oco_orders().is_empty());
}

#[test]
fn stop_loss_fill_cancels_take_profit() {
    let mut h = Harness::new(StaticFillModel {
        slipped: false,
        stop_filled: false,
        limit_filled: false,
    });
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let (entry, stop_loss, take_profit) = bracket_orders();
    h.submit_bracket(entry, stop_loss, Some(take_profit));

    h.tick(dec!(1.0988), dec!(1.0992), t0_plus(1));

    let fills = h.fills();
    assert_eq!(fills.len(), 2);
    assert_eq!(fills[1].cl_ord_id.as_str(), "O-SL");
    assert_eq!(fills[1].avg_price, dec!(1.0990));

    assert!(matches!(
        h.events_for("O-TP").last().unwrap(),
        OrderEvent::Cancelled(_)
    ));
    assert!(h.exchange.working_orders().is_empty());
    assert!(h.exchange.oco_orders().is_empty());
}

#[test]
fn bracket_without_take_profit_has_no_oco_pair() {
    let mut h = Harness::new(StaticFillModel {
        slipped: false,
        stop_filled: false,
        limit_filled: false,
    });
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let entry = market("O-E", OrderSide::Buy, dec!(10000));
    let stop_loss = stop("O-SL", OrderSide::Sell, dec!(10000), dec!(1.0990));
    h.submit_bracket(entry, stop_loss, None);

    assert!(h.exchange.oco_orders().is_empty());
    assert_eq!(h.exchange.working_orders().len(), 1);

    // Stop fires, closes the position, and the group is gone.
    h.tick(dec!(1.0988), dec!(1.0992), t0_plus(1));
    assert_eq!(h.fills().len(), 2);
    assert!(h.exchange.position_oco_orders().is_empty());
}

#[test]
fn expired_take_profit_cancels_its_sibling() {
    let mut h = Harness::new(StaticFillModel {
        slipped: false,
        stop_filled: false,
        limit_filled: false,
    });
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let entry = market("O-E", OrderSide::Buy, dec!(10000));
    let stop_loss = stop("O-SL", OrderSide::Sell, dec!(10000), dec!(1.0990));
    let take_profit =
        limit("O-TP", OrderSide::Sell, dec!(10000), dec!(1.1050)).with_expire_time(t0_plus(60));
    h.submit_bracket(entry, stop_loss, Some(take_profit));
    assert_eq!(h.exchange.working_orders().len(), 2);

    h.tick(dec!(1.1000), dec!(1.1002), t0_plus(61));

    assert!(matches!(
        h.events_for("O-TP").last().unwrap(),
        OrderEvent::Expired(_)
    ));
    assert!(matches!(
        h.events_for("O-SL").last().unwrap(),
        OrderEvent::Cancelled(_)
    ));
    assert!(h.exchange.working_orders().is_empty());
    assert!(h.exchange.oco_orders().is_empty());
}

// ── Entry teardown ───────────────────────────────────────────────────

#[test]
fn cancelling_the_entry_drops_dormant_children_silently() {
    let mut h = Harness::new(StaticFillModel {
        slipped: false,
        stop_filled: false,
        limit_filled: false,
    });
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let entry = limit("O-E", OrderSide::Buy, dec!(10000), dec!(1.0995));
    let stop_loss = stop("O-SL", OrderSide::Sell, dec!(10000), dec!(1.0990));
    let take_profit = limit("O-TP", OrderSide::Sell, dec!(10000), dec!(1.1050));
    h.submit_bracket(entry, stop_loss, Some(take_profit));

    h.cancel("O-E");

    assert!(h.exchange.working_orders().is_empty());
    assert!(h.exchange.child_orders().is_empty());
    assert!(h.exchange.oco_orders().is_empty());
    assert!(h.exchange.position_oco_orders().is_empty());
    // Children disappear without lifecycle events of their own.
    assert_eq!(h.events_for("O-SL").len(), 1); // just Submitted
    assert_eq!(h.events_for("O-TP").len(), 1);
}

#[test]
fn rejected_entry_rejects_its_children() {
    let instrument = eurusd().with_quantity_bounds(None, Some(dec!(5000)));
    let mut h = Harness::with_config(
        ExchangeConfig::new(Money::new(dec!(100000), Currency::usd())),
        vec![instrument],
        StaticFillModel::optimistic(),
    );
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let (entry, stop_loss, take_profit) = bracket_orders();
    h.submit_bracket(entry, stop_loss, Some(take_profit));

    let OrderEvent::Rejected(entry_reject) = h.events_for("O-E").last().unwrap().clone() else {
        panic!("expected entry rejection");
    };
    assert!(entry_reject.reason.contains("exceeds the maximum"));

    for child in ["O-SL", "O-TP"] {
        let OrderEvent::Rejected(rejected) = h.events_for(child).last().unwrap().clone() else {
            panic!("expected child rejection");
        };
        assert!(rejected.reason.contains("parent order O-E rejected"));
    }
    assert!(h.exchange.child_orders().is_empty());
    assert!(h.exchange.oco_orders().is_empty());
    assert!(h.exchange.position_index().is_empty());
    assert!(h.exchange.position_oco_orders().is_empty());
}

// ── Accounting across a round trip ───────────────────────────────────

#[test]
fn round_trip_realizes_pnl_net_of_commissions() {
    let mut h = Harness::new(StaticFillModel::optimistic());
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let (entry, stop_loss, take_profit) = bracket_orders();
    h.submit_bracket(entry, stop_loss, Some(take_profit));
    h.tick(dec!(1.1050), dec!(1.1052), t0_plus(1));

    let fills = h.fills();
    assert_eq!(fills.len(), 2);
    // Entry: taker, 10_000 * 1.1002 * 0.0002 = 2.20
    assert_eq!(fills[0].commission.amount, dec!(2.20));
    // Take-profit: maker, 10_000 * 1.1050 * 0.0001 = 1.105 -> 1.11
    assert_eq!(fills[1].commission.amount, dec!(1.11));

    // Realized points: (1.1050 - 1.1002) * 10_000 = 48.00
    let account = h.last_account();
    assert_eq!(account.total_commissions.amount, dec!(3.31));
    assert_eq!(account.balance.amount, dec!(100044.69));
    // total_commissions + (balance - start) == realized pnl
    assert_eq!(
        account.total_commissions.amount + (account.balance.amount - dec!(100000)),
        dec!(48.00)
    );

    // Execution ids are a dense global sequence.
    assert_eq!(fills[0].execution_id.as_str(), "E-1");
    assert_eq!(fills[1].execution_id.as_str(), "E-2");
}

#[test]
fn fill_event_ordering_is_fill_then_account_then_cascade() {
    let mut h = Harness::new(StaticFillModel::optimistic());
    h.tick(dec!(1.1000), dec!(1.1002), t0());

    let (entry, stop_loss, take_profit) = bracket_orders();
    h.submit_bracket(entry, stop_loss, Some(take_profit));
    let events_before = h.events().len();
    let accounts_before = h.account_events().len();

    h.tick(dec!(1.1050), dec!(1.1052), t0_plus(1));

    let events = h.events();
    let new_events = &events[events_before..];
    // Fill first, then the OCO cancel of the sibling.
    assert!(matches!(new_events[0], OrderEvent::Filled(_)));
    assert!(matches!(new_events[1], OrderEvent::Cancelled(_)));
    // Exactly one account state for the fill.
    assert_eq!(h.account_events().len(), accounts_before + 1);
}
