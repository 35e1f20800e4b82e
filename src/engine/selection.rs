//! Selection evaluation — compounded odds and the promotional-
//! combination policy.
//!
//! The storage layer resolves selection ids into time-valid, priced
//! [`Selection`]s; this module validates the set as a whole and computes
//! the ticket's total odds. Missing ids are deliberately not an error at
//! resolution time so that "selected but unavailable" and "selected but
//! non-existent" surface as one uniform failure here.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{Selection, ShopError};

use super::{round_money, MAX_SELECTION_COUNT, MIN_PROMO_COMBOS, PROMO_COMBO_ODDS_THRESHOLD};

// ---------------------------------------------------------------------------
// Odds accumulator
// ---------------------------------------------------------------------------

/// Running state of one evaluation pass, folded over the selections in
/// input order and returned by value.
#[derive(Debug, Clone, Copy)]
struct OddsAccumulator {
    total_odds: Decimal,
    promoted: bool,
    promo_combinations: usize,
}

impl OddsAccumulator {
    fn new() -> Self {
        Self {
            total_odds: Decimal::ONE,
            promoted: false,
            promo_combinations: 0,
        }
    }

    /// Fold one selection into the running totals.
    ///
    /// A promoted-fixture selection marks the whole ticket as promoted
    /// and never counts as a promotional combination itself; any other
    /// selection counts when its odds reach the threshold.
    fn observe(mut self, selection: &Selection) -> Self {
        if selection.is_promoted {
            self.promoted = true;
        } else if selection.odds >= PROMO_COMBO_ODDS_THRESHOLD {
            self.promo_combinations += 1;
        }

        self.total_odds *= selection.odds;

        self
    }

    /// The promotional-combination rule: a ticket touching a promoted
    /// fixture must carry at least `MIN_PROMO_COMBOS` qualifying
    /// non-promoted selections. No partial credit.
    fn ensure_valid_promo_selections(&self) -> Result<(), ShopError> {
        if self.promoted && self.promo_combinations < MIN_PROMO_COMBOS {
            return Err(ShopError::bad_input(format!(
                "Invalid promotion combination selected. If a promoted fixture is selected, \
                 at least {MIN_PROMO_COMBOS} non-promoted outcomes of odds greater than or \
                 equal to {PROMO_COMBO_ODDS_THRESHOLD:.2} must be selected, as well.",
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn ensure_valid_selection_count(selection_ids: &[i32]) -> Result<(), ShopError> {
    if selection_ids.is_empty() {
        return Err(ShopError::bad_input(
            "No outcome is selected. At least 1 outcome must be selected.",
        ));
    }
    if selection_ids.len() > MAX_SELECTION_COUNT {
        return Err(ShopError::bad_input(format!(
            "Too many outcomes are selected. No more than {MAX_SELECTION_COUNT} outcomes \
             may be selected.",
        )));
    }

    Ok(())
}

fn ensure_selection_is_available<'a>(
    resolved: &'a HashMap<i32, Selection>,
    selection_id: i32,
) -> Result<&'a Selection, ShopError> {
    resolved.get(&selection_id).ok_or_else(|| {
        ShopError::bad_input("An unavailable or non-existent outcome is selected.")
    })
}

fn ensure_unique_selection_event(
    selected_event_ids: &mut HashSet<i32>,
    selection: &Selection,
) -> Result<(), ShopError> {
    if !selected_event_ids.insert(selection.event_id) {
        return Err(ShopError::bad_input(
            "Duplicate events are selected. Each outcome must belong to a unique event; \
             no event may be selected more than once.",
        ));
    }

    Ok(())
}

/// Validate a selection set and compute the ticket's total odds.
///
/// Checks run in input order and short-circuit on the first failure:
/// selection count, per-id availability, one-selection-per-event
/// uniqueness, then the promotional-combination policy over the whole
/// set. The returned odds are the rounded product of all selection odds.
pub fn evaluate_selections(
    selection_ids: &[i32],
    resolved: &HashMap<i32, Selection>,
) -> Result<Decimal, ShopError> {
    ensure_valid_selection_count(selection_ids)?;

    let mut selected_event_ids = HashSet::new();
    let mut accumulator = OddsAccumulator::new();

    for &selection_id in selection_ids {
        let selection = ensure_selection_is_available(resolved, selection_id)?;
        ensure_unique_selection_event(&mut selected_event_ids, selection)?;

        accumulator = accumulator.observe(selection);
    }

    accumulator.ensure_valid_promo_selections()?;

    let total_odds = round_money(accumulator.total_odds);

    debug!(
        selections = selection_ids.len(),
        promoted = accumulator.promoted,
        promo_combinations = accumulator.promo_combinations,
        total_odds = %total_odds,
        "Selections evaluated"
    );

    Ok(total_odds)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
