//! BETSHOP — Simulated sportsbook betting engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! seeds an in-memory store with a small betting offer, and walks one
//! deposit → browse → place-bet → report scenario against it.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use betshop::account::Account;
use betshop::config::AppConfig;
use betshop::engine::placer::BetPlacer;
use betshop::engine::DEFAULT_TAKE_N;
use betshop::offer::OfferBrowser;
use betshop::storage::{self, MemoryStore};
use betshop::types::{
    Event, EventStatus, Fixture, FixtureKind, Market, Outcome, Sport, User,
};

const BANNER: &str = r#"
 ____  _____ _____ ____  _   _  ___  ____
| __ )| ____|_   _/ ___|| | | |/ _ \|  _ \
|  _ \|  _|   | | \___ \| |_| | | | | |_) |
| |_) | |___  | |  ___) |  _  | |_| |  __/
|____/|_____| |_| |____/|_| |_|\___/|_|

  Simulated Sportsbook Betting Engine
  v0.1.0 — Demo
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load_or_default("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        shop = %cfg.shop.name,
        currency = %cfg.shop.currency,
        "BETSHOP starting up"
    );

    // -- Seed the in-memory store ----------------------------------------

    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());

    store.insert_user(User {
        id: 1,
        username: cfg.demo.username.clone(),
        balance: cfg.demo.starting_balance,
        registered_on: now - Duration::days(30),
        deactivated_on: None,
    })?;
    store.set_tax_grades(cfg.tax_grades())?;
    for event in sample_offer(now) {
        store.insert_event(event)?;
    }

    let account = Account::new(store.clone());
    let browser = OfferBrowser::new(store.clone());
    let placer = BetPlacer::new(store.clone());
    let cancel = CancellationToken::new();

    // -- Deposit ---------------------------------------------------------

    let transaction = account
        .make_transaction(now, 1, true, cfg.demo.deposit_amount, &cancel)
        .await?;
    info!(%transaction, "Deposit made");

    // -- Browse the offer ------------------------------------------------

    let offer = browser
        .browse(now, Some(false), 0, DEFAULT_TAKE_N, &cancel)
        .await?;
    for event in &offer {
        info!(event = %event, "Offered");
    }

    // -- Place a bet on the first outcome of the first two events --------

    let selection_ids: Vec<i32> = offer
        .iter()
        .take(2)
        .filter_map(|e| {
            e.fixtures
                .first()
                .and_then(|f| f.markets.first())
                .and_then(|m| m.outcomes.first())
                .map(|o| o.id)
        })
        .collect();

    let ticket = placer
        .place_bet(now, 1, &selection_ids, cfg.demo.bet_amount, &cancel)
        .await?;
    for selection in &ticket.selections {
        info!(selection = %selection, "Selected");
    }
    info!(ticket = %ticket, "Ticket issued");

    // -- Report financial amounts and final balance ----------------------

    let amounts = placer
        .ticket_financial_amounts(ticket.id, None, &cancel)
        .await?;
    info!(amounts = %amounts, "Financial breakdown");

    let user = account.get_user(1, None, &cancel).await?;
    info!(user = %user, "Final state");

    // Persist a snapshot so a later run can inspect the session
    storage::save_snapshot(&store.snapshot()?, None)?;
    info!("BETSHOP demo finished.");

    Ok(())
}

/// A small three-event offer: two regular fixtures and one promoted.
fn sample_offer(now: DateTime<Utc>) -> Vec<Event> {
    let window = (now - Duration::hours(1), now + Duration::hours(12));
    let football = Sport {
        id: 1,
        name: "Football".to_string(),
        priority: 1,
    };
    let basketball = Sport {
        id: 2,
        name: "Basketball".to_string(),
        priority: 2,
    };

    let make_outcome = |id: i32, name: &str, odds: rust_decimal::Decimal| Outcome {
        id,
        name: name.to_string(),
        value: None,
        odds: Some(odds),
        available_from: window.0,
        available_until: window.1,
    };
    let make_event = |id: i32, name: &str, sport: &Sport, promoted: bool, outcomes: Vec<Outcome>| {
        Event {
            id,
            name: name.to_string(),
            sport: sport.clone(),
            starts_at: now + Duration::hours(13),
            ends_at: now + Duration::hours(15),
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
                    outcomes,
                }],
            }],
        }
    };

    vec![
        make_event(
            1,
            "Dynamo - Lokomotiva",
            &football,
            false,
            vec![
                make_outcome(11, "1", dec!(2.00)),
                make_outcome(12, "X", dec!(3.25)),
                make_outcome(13, "2", dec!(3.60)),
            ],
        ),
        make_event(
            2,
            "Cibona - Zadar",
            &basketball,
            false,
            vec![
                make_outcome(21, "1", dec!(1.50)),
                make_outcome(22, "2", dec!(2.55)),
            ],
        ),
        make_event(
            3,
            "Hajduk - Rijeka",
            &football,
            true,
            vec![
                make_outcome(31, "1", dec!(2.10)),
                make_outcome(32, "X", dec!(3.10)),
                make_outcome(33, "2", dec!(3.40)),
            ],
        ),
    ]
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("betshop=info"));

    let json_logging = std::env::var("BETSHOP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
