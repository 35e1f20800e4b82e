//! Offer browsing.
//!
//! Prunes the event → fixture → market → outcome tree to what is
//! actually available at a point in time, filters promoted fixtures on
//! request, and sorts the result the way the shop presents it. Events
//! that are rescheduled or cancelled never appear.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::ensure_not_cancelled;
use crate::types::{Event, Fixture, Market, ShopError};

use crate::storage::BetStore;

pub struct OfferBrowser {
    store: Arc<dyn BetStore>,
}

impl OfferBrowser {
    pub fn new(store: Arc<dyn BetStore>) -> Self {
        Self { store }
    }

    /// The betting offer as visible at `available_at`.
    ///
    /// An event is listed when it has not yet ended, its status is
    /// listable, and at least one of its fixtures is available at
    /// `available_at` (matching the `promoted` filter when one is
    /// given). Fixtures, markets, and outcomes are pruned to their
    /// availability windows; unpriced outcomes are dropped. `skip`
    /// and `take` page the sorted event list
    /// (see [`crate::engine::DEFAULT_TAKE_N`]).
    pub async fn browse(
        &self,
        available_at: DateTime<Utc>,
        promoted: Option<bool>,
        skip: usize,
        take: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Event>, ShopError> {
        debug!(
            available_at = %available_at,
            promoted = ?promoted,
            skip,
            take,
            "Browsing offer..."
        );

        ensure_not_cancelled(cancel)?;

        let events = self.store.offer_events().await?;

        ensure_not_cancelled(cancel)?;

        let mut listed: Vec<Event> = events
            .into_iter()
            .filter(|e| e.ends_at > available_at && e.status.is_listable())
            .filter_map(|e| prune_event(e, available_at, promoted))
            .collect();

        listed.sort_by(|a, b| {
            (a.starts_at.date_naive(), a.priority, a.sport.priority, a.starts_at)
                .cmp(&(b.starts_at.date_naive(), b.priority, b.sport.priority, b.starts_at))
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.ends_at.cmp(&b.ends_at))
        });

        let page: Vec<Event> = listed.into_iter().skip(skip).take(take).collect();

        info!(events = page.len(), "Offer browsed");

        Ok(page)
    }
}

/// Prune one event to its available content; None when nothing remains.
fn prune_event(mut event: Event, at: DateTime<Utc>, promoted: Option<bool>) -> Option<Event> {
    let mut fixtures: Vec<Fixture> = event
        .fixtures
        .into_iter()
        .filter(|f| f.is_available(at) && promoted.map_or(true, |p| f.kind.is_promoted == p))
        .map(|f| prune_fixture(f, at))
        .collect();

    if fixtures.is_empty() {
        return None;
    }

    fixtures.sort_by(|a, b| {
        a.kind
            .priority
            .cmp(&b.kind.priority)
            .then_with(|| a.kind.name.cmp(&b.kind.name))
    });

    event.fixtures = fixtures;
    Some(event)
}

fn prune_fixture(mut fixture: Fixture, at: DateTime<Utc>) -> Fixture {
    let mut markets: Vec<Market> = fixture
        .markets
        .into_iter()
        .filter(|m| m.is_available(at))
        .map(|mut market| {
            market
                .outcomes
                .retain(|o| o.is_bettable(at));
            market
                .outcomes
                .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.value.cmp(&b.value)));
            market
        })
        .collect();

    markets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.value.cmp(&b.value)));

    fixture.markets = markets;
    fixture
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
