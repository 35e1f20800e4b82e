//! Bet placement scenarios.

use chrono::Utc;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use betshop::engine::placer::BetPlacer;
use betshop::storage::BetStore;
use betshop::types::{TicketStatus, TransactionKind};

use crate::harness::{seed_store, STARTING_BALANCE, USER_ID};

#[tokio::test]
async fn placing_a_two_way_combo_debits_and_persists() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store.clone());
    let cancel = CancellationToken::new();

    // Two outcomes from two distinct events: 2.00 × 1.50.
    let ticket = placer
        .place_bet(now, USER_ID, &[11, 21], dec!(50.00), &cancel)
        .await
        .unwrap();

    assert_eq!(ticket.total_odds, dec!(3.00));
    assert_eq!(ticket.status, TicketStatus::Active);
    assert!(!ticket.is_resolved);
    assert_eq!(ticket.selections.len(), 2);

    // Balance 1000 − 50 = 950.
    let user = store.user_by_id(USER_ID).await.unwrap().unwrap();
    assert_eq!(user.balance, dec!(950.00));

    // The pay-in transaction is linked to the ticket.
    let transactions = store.transactions().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, TransactionKind::PayIn);
    assert_eq!(transactions[0].ticket_id, Some(ticket.id));
    assert_eq!(transactions[0].amount, dec!(50.00));

    // The ticket is queryable afterwards.
    let stored = store.ticket_by_id(ticket.id, Some(now)).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn financial_amounts_of_a_placed_ticket() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store.clone());
    let cancel = CancellationToken::new();

    let ticket = placer
        .place_bet(now, USER_ID, &[11, 21], dec!(100.00), &cancel)
        .await
        .unwrap();

    let amounts = placer
        .ticket_financial_amounts(ticket.id, Some(now), &cancel)
        .await
        .unwrap();

    assert_eq!(amounts.pay_in_amount, dec!(100.00));
    assert_eq!(amounts.active_amount, dec!(95.00));
    assert_eq!(amounts.total_odds, dec!(3.00));
    assert_eq!(amounts.gross_potential_win_amount, dec!(285.00));
    assert_eq!(amounts.tax, dec!(28.50));
    assert_eq!(amounts.net_potential_win_amount, dec!(256.50));
}

#[tokio::test]
async fn unknown_user_leaves_no_trace() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store.clone());

    let err = placer
        .place_bet(now, 999, &[11], dec!(50.00), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(store.tickets().unwrap().is_empty());
    assert!(store.transactions().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_placement_writes_nothing() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = placer
        .place_bet(now, USER_ID, &[11, 21], dec!(50.00), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(store.tickets().unwrap().is_empty());
    let user = store.user_by_id(USER_ID).await.unwrap().unwrap();
    assert_eq!(user.balance, STARTING_BALANCE);
}

#[tokio::test]
async fn infrastructure_failure_surfaces_opaque_and_writes_nothing() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store.clone());

    store.set_error("simulated database outage");
    let err = placer
        .place_bet(now, USER_ID, &[11, 21], dec!(50.00), &CancellationToken::new())
        .await
        .unwrap_err();
    store.clear_error();

    assert_eq!(format!("{err}"), "Internal server error.");
    assert!(store.tickets().unwrap().is_empty());
    let user = store.user_by_id(USER_ID).await.unwrap().unwrap();
    assert_eq!(user.balance, STARTING_BALANCE);
}

#[tokio::test]
async fn duplicate_event_selections_are_rejected() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store);

    // Outcomes 11 and 12 belong to the same event.
    let err = placer
        .place_bet(now, USER_ID, &[11, 12], dec!(50.00), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_bad_input());
    assert!(format!("{err}").contains("Duplicate events"));
}

#[tokio::test]
async fn unpriced_and_expired_outcomes_are_unavailable() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store);
    let cancel = CancellationToken::new();

    // Outcome 13 exists but carries no odds.
    let err = placer
        .place_bet(now, USER_ID, &[13], dec!(50.00), &cancel)
        .await
        .unwrap_err();
    assert!(format!("{err}").contains("unavailable or non-existent"));

    // Outcome 101 is priced but its window has closed.
    let err = placer
        .place_bet(now, USER_ID, &[101], dec!(50.00), &cancel)
        .await
        .unwrap_err();
    assert!(format!("{err}").contains("unavailable or non-existent"));
}

#[tokio::test]
async fn promoted_fixture_requires_five_promo_combinations() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store);
    let cancel = CancellationToken::new();

    // Promoted outcome 31 with only four qualifying companions.
    let err = placer
        .place_bet(now, USER_ID, &[31, 41, 51, 61, 71], dec!(50.00), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_bad_input());
    assert!(format!("{err}").contains("Invalid promotion combination"));

    // A below-threshold fifth companion does not help.
    let err = placer
        .place_bet(now, USER_ID, &[31, 41, 51, 61, 71, 91], dec!(50.00), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_bad_input());
}

#[tokio::test]
async fn promoted_fixture_with_five_promo_combinations_succeeds() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store.clone());

    let ticket = placer
        .place_bet(
            now,
            USER_ID,
            &[31, 41, 51, 61, 71, 81],
            dec!(50.00),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // 2.00 × 1.50⁵ = 15.1875 → 15.19
    assert_eq!(ticket.total_odds, dec!(15.19));
    let user = store.user_by_id(USER_ID).await.unwrap().unwrap();
    assert_eq!(user.balance, dec!(950.00));
}

#[tokio::test]
async fn pay_in_amount_bounds_are_enforced_end_to_end() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store.clone());
    let cancel = CancellationToken::new();

    let err = placer
        .place_bet(now, USER_ID, &[11], dec!(0.24), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_bad_input());

    let err = placer
        .place_bet(now, USER_ID, &[11], dec!(1000.01), &cancel)
        .await
        .unwrap_err();
    assert!(format!("{err}").contains("exceeds the current balance"));

    // The boundary itself is accepted.
    let ticket = placer
        .place_bet(now, USER_ID, &[11], dec!(0.25), &cancel)
        .await
        .unwrap();
    assert_eq!(ticket.pay_in_amount, dec!(0.25));
}

#[tokio::test]
async fn empty_selection_is_rejected() {
    let now = Utc::now();
    let store = seed_store(now);
    let placer = BetPlacer::new(store);

    let err = placer
        .place_bet(now, USER_ID, &[], dec!(50.00), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_bad_input());
    assert!(format!("{err}").contains("No outcome is selected"));
}
