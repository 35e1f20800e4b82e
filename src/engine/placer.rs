//! Bet placement orchestrator.
//!
//! Drives one placement attempt end to end: load user → validate pay-in
//! amount → resolve selections → evaluate odds → commit ticket, pay-in
//! transaction, and balance debit as one atomic unit through the store.
//! Also answers the financial breakdown of an existing ticket.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::storage::{BetStore, NewBet};
use crate::types::{Selection, ShopError, Ticket};

use super::finance::{calculate_ticket_amounts, TicketFinancialAmounts};
use super::selection::evaluate_selections;
use super::{ensure_not_cancelled, round_money, MAX_BET_AMOUNT, MIN_BET_AMOUNT};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Round and validate a pay-in amount against the betting limits and the
/// user's current balance. Returns the rounded amount that will be staked.
fn ensure_valid_pay_in_amount(balance: Decimal, amount: Decimal) -> Result<Decimal, ShopError> {
    let amount = round_money(amount);

    if amount < Decimal::ZERO {
        return Err(ShopError::bad_input("Pay-in amount is negative."));
    }
    if amount < MIN_BET_AMOUNT || amount > MAX_BET_AMOUNT {
        return Err(ShopError::bad_input(format!(
            "Pay-in amount is out of range. Minimal allowed bet is {MIN_BET_AMOUNT:.2}, \
             maximal allowed bet is {MAX_BET_AMOUNT:.2}.",
        )));
    }
    if amount > balance {
        return Err(ShopError::bad_input(format!(
            "Pay-in amount exceeds the current balance of {balance:.2}.",
        )));
    }

    Ok(amount)
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct BetPlacer {
    store: Arc<dyn BetStore>,
}

impl BetPlacer {
    pub fn new(store: Arc<dyn BetStore>) -> Self {
        Self { store }
    }

    /// Place a multi-selection bet.
    ///
    /// On success the ticket, its pay-in transaction, and the balance
    /// debit have all been committed; on any error nothing has been
    /// written. Cancellation is honored between steps and always aborts
    /// before the commit.
    pub async fn place_bet(
        &self,
        placed_at: DateTime<Utc>,
        user_id: i32,
        selection_ids: &[i32],
        amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Ticket, ShopError> {
        debug!(
            placed_at = %placed_at,
            user_id,
            selection_ids = ?selection_ids,
            amount = %amount,
            "Placing new bet..."
        );

        let result = self
            .place_bet_inner(placed_at, user_id, selection_ids, amount, cancel)
            .await;

        match &result {
            Ok(ticket) => info!(
                user_id,
                ticket_id = ticket.id,
                amount = %ticket.pay_in_amount,
                total_odds = %ticket.total_odds,
                "New bet successfully placed"
            ),
            Err(ShopError::Cancelled) => debug!(user_id, "Bet placement cancelled"),
            Err(e @ ShopError::Server(_)) => error!(
                placed_at = %placed_at,
                user_id,
                selection_ids = ?selection_ids,
                amount = %amount,
                error = ?e,
                "Error while placing new bet"
            ),
            Err(e) => warn!(
                user_id,
                amount = %amount,
                reason = %e,
                "Bet rejected"
            ),
        }

        result
    }

    async fn place_bet_inner(
        &self,
        placed_at: DateTime<Utc>,
        user_id: i32,
        selection_ids: &[i32],
        amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Ticket, ShopError> {
        ensure_not_cancelled(cancel)?;

        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ShopError::not_found("The user does not exist."))?;

        let amount = ensure_valid_pay_in_amount(user.balance, amount)?;

        ensure_not_cancelled(cancel)?;

        let resolved = self
            .store
            .resolve_selections(placed_at, selection_ids)
            .await?;
        let total_odds = evaluate_selections(selection_ids, &resolved)?;

        // Snapshot the selections in the bettor's input order. Every id
        // is guaranteed present once evaluation has passed.
        let selections: Vec<Selection> = selection_ids
            .iter()
            .map(|id| {
                resolved.get(id).cloned().ok_or_else(|| {
                    ShopError::server(anyhow!("selection {id} missing after evaluation"))
                })
            })
            .collect::<Result<_, _>>()?;

        ensure_not_cancelled(cancel)?;

        self.store
            .commit_bet(NewBet {
                user_id,
                selections,
                placed_at,
                amount,
                total_odds,
            })
            .await
    }

    /// The financial breakdown of an existing ticket under the current
    /// tax schedule.
    pub async fn ticket_financial_amounts(
        &self,
        ticket_id: i32,
        state_at: Option<DateTime<Utc>>,
        cancel: &CancellationToken,
    ) -> Result<TicketFinancialAmounts, ShopError> {
        debug!(ticket_id, state_at = ?state_at, "Calculating ticket financial amounts...");

        ensure_not_cancelled(cancel)?;

        let ticket = self
            .store
            .ticket_by_id(ticket_id, state_at)
            .await?
            .ok_or_else(|| ShopError::not_found("The ticket does not exist."))?;

        ensure_not_cancelled(cancel)?;

        let tax_grades = self.store.tax_grades().await?;
        let amounts =
            calculate_ticket_amounts(&tax_grades, ticket.pay_in_amount, ticket.total_odds);

        info!(ticket_id, amounts = %amounts, "Ticket financial amounts calculated");

        Ok(amounts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
