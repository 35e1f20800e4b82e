//! Core betting engine — selection evaluation, financial math, and the
//! bet placement orchestrator.

pub mod finance;
pub mod placer;
pub mod selection;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use crate::types::ShopError;

// ---------------------------------------------------------------------------
// Contract constants
// ---------------------------------------------------------------------------

/// A ticket may combine at most this many selections.
pub const MAX_SELECTION_COUNT: usize = 70;

/// Non-promoted selections priced at or above this threshold count as
/// promotional combinations.
pub const PROMO_COMBO_ODDS_THRESHOLD: Decimal = dec!(1.10);

/// Minimum number of promotional combinations required when a promoted
/// fixture is selected.
pub const MIN_PROMO_COMBOS: usize = 5;

/// Inclusive pay-in bounds for a single bet.
pub const MIN_BET_AMOUNT: Decimal = dec!(0.25);
pub const MAX_BET_AMOUNT: Decimal = dec!(250_000.00);

/// Inclusive bounds for a single deposit or withdrawal.
pub const MIN_TRANSACTION_AMOUNT: Decimal = dec!(1.00);
pub const MAX_TRANSACTION_AMOUNT: Decimal = dec!(250_000.00);

/// House-margin deduction applied to the stake before odds are applied.
pub const MANIPULATIVE_COST_RATE: Decimal = dec!(0.05);

/// Default page size for offer browsing.
pub const DEFAULT_TAKE_N: usize = 1000;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Round a monetary value (or odds) to two decimal places.
///
/// Banker's rounding (midpoint to even) is used for every stored amount,
/// so intermediate and final figures stay mutually consistent.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Early-return with `ShopError::Cancelled` once the caller has given up.
///
/// Checked between every placement step; nothing is ever written after a
/// cancellation is observed.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), ShopError> {
    if cancel.is_cancelled() {
        Err(ShopError::Cancelled)
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
