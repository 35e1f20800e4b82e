//! Account operations — deposits, withdrawals, and user lookups.
//!
//! Structurally a sibling of the bet placement orchestrator: validate,
//! then hand one atomic write to the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{
    ensure_not_cancelled, round_money, MAX_TRANSACTION_AMOUNT, MIN_TRANSACTION_AMOUNT,
};
use crate::storage::{BetStore, NewAccountTransaction};
use crate::types::{ShopError, Transaction, TransactionKind, User};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Round and validate a deposit/withdrawal amount. Withdrawals may not
/// exceed the current balance; deposits are not balance-constrained.
fn ensure_valid_transaction_amount(
    deposit: bool,
    balance: Decimal,
    amount: Decimal,
) -> Result<Decimal, ShopError> {
    let amount = round_money(amount);

    if amount < Decimal::ZERO {
        return Err(ShopError::bad_input("Transaction amount is negative."));
    }
    if amount < MIN_TRANSACTION_AMOUNT || amount > MAX_TRANSACTION_AMOUNT {
        return Err(ShopError::bad_input(format!(
            "Transaction amount is out of range. Minimal allowed transaction is \
             {MIN_TRANSACTION_AMOUNT:.2}, maximal allowed single transaction is \
             {MAX_TRANSACTION_AMOUNT:.2}.",
        )));
    }
    if !deposit && amount > balance {
        return Err(ShopError::bad_input(format!(
            "Withdrawal amount exceeds the current balance of {balance:.2}.",
        )));
    }

    Ok(amount)
}

// ---------------------------------------------------------------------------
// Account service
// ---------------------------------------------------------------------------

pub struct Account {
    store: Arc<dyn BetStore>,
}

impl Account {
    pub fn new(store: Arc<dyn BetStore>) -> Self {
        Self { store }
    }

    /// Deposit into or withdraw from a user's balance.
    pub async fn make_transaction(
        &self,
        time: DateTime<Utc>,
        user_id: i32,
        deposit: bool,
        amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Transaction, ShopError> {
        debug!(time = %time, user_id, deposit, amount = %amount, "Making new transaction...");

        let result = self
            .make_transaction_inner(time, user_id, deposit, amount, cancel)
            .await;

        match &result {
            Ok(transaction) => info!(
                user_id,
                transaction_id = transaction.id,
                kind = %transaction.kind,
                amount = %transaction.amount,
                "New transaction successfully made"
            ),
            Err(ShopError::Cancelled) => debug!(user_id, "Transaction cancelled"),
            Err(e @ ShopError::Server(_)) => error!(
                time = %time,
                user_id,
                deposit,
                amount = %amount,
                error = ?e,
                "Error while making new transaction"
            ),
            Err(e) => warn!(user_id, amount = %amount, reason = %e, "Transaction rejected"),
        }

        result
    }

    async fn make_transaction_inner(
        &self,
        time: DateTime<Utc>,
        user_id: i32,
        deposit: bool,
        amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Transaction, ShopError> {
        ensure_not_cancelled(cancel)?;

        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ShopError::not_found("The user does not exist."))?;

        let amount = ensure_valid_transaction_amount(deposit, user.balance, amount)?;

        ensure_not_cancelled(cancel)?;

        self.store
            .commit_account_transaction(NewAccountTransaction {
                user_id,
                kind: if deposit {
                    TransactionKind::Deposit
                } else {
                    TransactionKind::Withdrawal
                },
                time,
                amount,
            })
            .await
    }

    /// Fetch a user, optionally only if the account was active at
    /// `state_at` (registered and not yet deactivated).
    pub async fn get_user(
        &self,
        id: i32,
        state_at: Option<DateTime<Utc>>,
        cancel: &CancellationToken,
    ) -> Result<User, ShopError> {
        debug!(id, state_at = ?state_at, "Fetching user...");

        ensure_not_cancelled(cancel)?;

        let user = self
            .store
            .user_by_id(id)
            .await?
            .filter(|u| state_at.map_or(true, |at| u.is_active_at(at)))
            .ok_or_else(|| ShopError::not_found("The user does not exist."))?;

        info!(id, username = %user.username, "User fetched");

        Ok(user)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
