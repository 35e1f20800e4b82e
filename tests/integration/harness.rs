//! Shared harness — a deterministic in-memory shop.
//!
//! All scenarios run against the same seeded offer, anchored to a
//! caller-supplied "now" so that availability windows are predictable.
//!
//! Seeded content (all windows are `now − 1h` until `now + 12h` unless
//! noted):
//! - user #1 "punter" with balance 1000.00, the reference tax schedule
//! - event 1 (Football, regular): outcomes 11 @ 2.00, 12 @ 3.25,
//!   13 unpriced
//! - event 2 (Basketball, regular): outcomes 21 @ 1.50, 22 @ 2.55
//! - event 3 (Football, PROMOTED): outcome 31 @ 2.00
//! - events 4–8 (regular): outcomes 41/51/61/71/81, each @ 1.50
//! - event 9 (regular): outcome 91 @ 1.05 (below the promo threshold)
//! - event 10 (regular): outcome 101 @ 2.00 with an already-expired
//!   window

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use betshop::storage::MemoryStore;
use betshop::types::{
    Event, EventStatus, Fixture, FixtureKind, Market, Outcome, Sport, TaxGrade, User,
};

pub const USER_ID: i32 = 1;
pub const STARTING_BALANCE: Decimal = dec!(1000.00);

/// The reference schedule: 10% to 10k, 15% to 30k, 30% above.
pub fn reference_tax_grades() -> Vec<TaxGrade> {
    vec![
        TaxGrade {
            lower_bound: None,
            upper_bound: Some(dec!(10_000.00)),
            rate: dec!(0.10),
        },
        TaxGrade {
            lower_bound: Some(dec!(10_000.00)),
            upper_bound: Some(dec!(30_000.00)),
            rate: dec!(0.15),
        },
        TaxGrade {
            lower_bound: Some(dec!(30_000.00)),
            upper_bound: None,
            rate: dec!(0.30),
        },
    ]
}

fn make_event(
    id: i32,
    sport: (&str, i32),
    promoted: bool,
    window: (DateTime<Utc>, DateTime<Utc>),
    outcomes: Vec<(i32, &str, Option<Decimal>)>,
) -> Event {
    Event {
        id,
        name: format!("event-{id}"),
        sport: Sport {
            id: sport.1,
            name: sport.0.to_string(),
            priority: sport.1,
        },
        starts_at: window.1 + Duration::hours(1),
        ends_at: window.1 + Duration::hours(3),
        status: EventStatus::Scheduled,
        priority: id,
        fixtures: vec![Fixture {
            kind: FixtureKind {
                name: if promoted { "promoted" } else { "prematch" }.to_string(),
                is_promoted: promoted,
                priority: 1,
            },
            available_from: window.0,
            available_until: window.1,
            markets: vec![Market {
                id: id * 100,
                name: "Winner".to_string(),
                value: None,
                available_from: window.0,
                available_until: window.1,
                outcomes: outcomes
                    .into_iter()
                    .map(|(oid, name, odds)| Outcome {
                        id: oid,
                        name: name.to_string(),
                        value: None,
                        odds,
                        available_from: window.0,
                        available_until: window.1,
                    })
                    .collect(),
            }],
        }],
    }
}

/// Seed the full scenario store, anchored at `now`.
pub fn seed_store(now: DateTime<Utc>) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    let window = (now - Duration::hours(1), now + Duration::hours(12));
    let football = ("Football", 1);
    let basketball = ("Basketball", 2);

    store
        .insert_user(User {
            id: USER_ID,
            username: "punter".to_string(),
            balance: STARTING_BALANCE,
            registered_on: now - Duration::days(30),
            deactivated_on: None,
        })
        .unwrap();
    store.set_tax_grades(reference_tax_grades()).unwrap();

    store
        .insert_event(make_event(
            1,
            football,
            false,
            window,
            vec![
                (11, "1", Some(dec!(2.00))),
                (12, "X", Some(dec!(3.25))),
                (13, "2", None),
            ],
        ))
        .unwrap();
    store
        .insert_event(make_event(
            2,
            basketball,
            false,
            window,
            vec![(21, "1", Some(dec!(1.50))), (22, "2", Some(dec!(2.55)))],
        ))
        .unwrap();
    store
        .insert_event(make_event(
            3,
            football,
            true,
            window,
            vec![(31, "1", Some(dec!(2.00)))],
        ))
        .unwrap();
    for (event_id, outcome_id) in [(4, 41), (5, 51), (6, 61), (7, 71), (8, 81)] {
        store
            .insert_event(make_event(
                event_id,
                football,
                false,
                window,
                vec![(outcome_id, "1", Some(dec!(1.50)))],
            ))
            .unwrap();
    }
    store
        .insert_event(make_event(
            9,
            football,
            false,
            window,
            vec![(91, "1", Some(dec!(1.05)))],
        ))
        .unwrap();
    store
        .insert_event(make_event(
            10,
            football,
            false,
            (now - Duration::hours(6), now - Duration::hours(3)),
            vec![(101, "1", Some(dec!(2.00)))],
        ))
        .unwrap();

    Arc::new(store)
}
