//! In-memory reference store.
//!
//! Keeps the whole shop state behind one mutex. Each `commit_*` call
//! performs its checks first and its writes last, inside a single
//! critical section, so a commit either lands completely or not at all.
//! A forced-error switch lets tests simulate infrastructure failures at
//! the commit boundary.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::types::{
    Event, Selection, ShopError, TaxGrade, Ticket, TicketStatus, Transaction, TransactionKind,
    User,
};

use super::{BetStore, NewAccountTransaction, NewBet};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The complete persisted state of the shop, snapshot-friendly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopState {
    pub users: HashMap<i32, User>,
    pub events: Vec<Event>,
    pub tax_grades: Vec<TaxGrade>,
    pub tickets: Vec<Ticket>,
    pub transactions: Vec<Transaction>,
    pub next_ticket_id: i32,
    pub next_transaction_id: i32,
}

impl Default for ShopState {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            events: Vec::new(),
            tax_grades: Vec::new(),
            tickets: Vec::new(),
            transactions: Vec::new(),
            next_ticket_id: 1,
            next_transaction_id: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// In-memory [`BetStore`] implementation.
pub struct MemoryStore {
    state: Mutex<ShopState>,
    /// If set, all operations will return a server error.
    force_error: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_state(ShopState::default())
    }

    /// Create a store from a previously captured snapshot.
    pub fn from_state(state: ShopState) -> Self {
        Self {
            state: Mutex::new(state),
            force_error: Mutex::new(None),
        }
    }

    /// Capture the current state for snapshotting.
    pub fn snapshot(&self) -> Result<ShopState, ShopError> {
        Ok(self.state()?.clone())
    }

    /// Seed a user.
    pub fn insert_user(&self, user: User) -> Result<(), ShopError> {
        self.state()?.users.insert(user.id, user);
        Ok(())
    }

    /// Seed an event aggregate.
    pub fn insert_event(&self, event: Event) -> Result<(), ShopError> {
        self.state()?.events.push(event);
        Ok(())
    }

    /// Replace the tax schedule.
    pub fn set_tax_grades(&self, tax_grades: Vec<TaxGrade>) -> Result<(), ShopError> {
        self.state()?.tax_grades = tax_grades;
        Ok(())
    }

    /// All persisted tickets (cloned).
    pub fn tickets(&self) -> Result<Vec<Ticket>, ShopError> {
        Ok(self.state()?.tickets.clone())
    }

    /// All persisted transactions (cloned).
    pub fn transactions(&self) -> Result<Vec<Transaction>, ShopError> {
        Ok(self.state()?.transactions.clone())
    }

    /// Force all subsequent operations to return a server error.
    pub fn set_error(&self, message: &str) {
        if let Ok(mut guard) = self.force_error.lock() {
            *guard = Some(message.to_string());
        }
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        if let Ok(mut guard) = self.force_error.lock() {
            *guard = None;
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, ShopState>, ShopError> {
        self.state
            .lock()
            .map_err(|_| ShopError::server(anyhow!("shop state mutex poisoned")))
    }

    fn ensure_no_forced_error(&self) -> Result<(), ShopError> {
        let guard = self
            .force_error
            .lock()
            .map_err(|_| ShopError::server(anyhow!("force-error mutex poisoned")))?;
        if let Some(message) = guard.as_ref() {
            return Err(ShopError::server(anyhow!("{message}")));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BetStore for MemoryStore {
    async fn user_by_id(&self, id: i32) -> Result<Option<User>, ShopError> {
        self.ensure_no_forced_error()?;
        Ok(self.state()?.users.get(&id).cloned())
    }

    async fn resolve_selections(
        &self,
        at: DateTime<Utc>,
        selection_ids: &[i32],
    ) -> Result<HashMap<i32, Selection>, ShopError> {
        self.ensure_no_forced_error()?;

        let wanted: HashSet<i32> = selection_ids.iter().copied().collect();
        let state = self.state()?;

        let mut resolved = HashMap::new();
        for event in &state.events {
            for fixture in &event.fixtures {
                for market in &fixture.markets {
                    for outcome in &market.outcomes {
                        if !wanted.contains(&outcome.id) || !outcome.is_bettable(at) {
                            continue;
                        }
                        let odds = match outcome.odds {
                            Some(odds) => odds,
                            None => continue,
                        };
                        resolved.insert(
                            outcome.id,
                            Selection {
                                outcome_id: outcome.id,
                                event_id: event.id,
                                event_name: event.name.clone(),
                                market_name: market.name.clone(),
                                outcome_name: outcome.name.clone(),
                                odds,
                                is_promoted: fixture.kind.is_promoted,
                            },
                        );
                    }
                }
            }
        }

        Ok(resolved)
    }

    async fn tax_grades(&self) -> Result<Vec<TaxGrade>, ShopError> {
        self.ensure_no_forced_error()?;
        Ok(self.state()?.tax_grades.clone())
    }

    async fn ticket_by_id(
        &self,
        id: i32,
        state_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Ticket>, ShopError> {
        self.ensure_no_forced_error()?;
        Ok(self
            .state()?
            .tickets
            .iter()
            .find(|t| t.id == id && state_at.map_or(true, |at| t.pay_in_time <= at))
            .cloned())
    }

    async fn commit_bet(&self, bet: NewBet) -> Result<Ticket, ShopError> {
        self.ensure_no_forced_error()?;

        let mut state = self.state()?;

        // All checks happen before the first write.
        if !state.users.contains_key(&bet.user_id) {
            return Err(ShopError::server(anyhow!(
                "user #{} disappeared before commit",
                bet.user_id,
            )));
        }

        let ticket = Ticket {
            id: state.next_ticket_id,
            user_id: bet.user_id,
            selections: bet.selections,
            pay_in_amount: bet.amount,
            pay_in_time: bet.placed_at,
            total_odds: bet.total_odds,
            status: TicketStatus::Active,
            is_resolved: false,
            resolved_time: None,
            cost_amount: None,
            win_amount: None,
            pay_out_time: None,
        };
        let transaction = Transaction {
            id: state.next_transaction_id,
            user_id: bet.user_id,
            kind: TransactionKind::PayIn,
            ticket_id: Some(ticket.id),
            time: bet.placed_at,
            amount: bet.amount,
        };

        if let Some(user) = state.users.get_mut(&bet.user_id) {
            user.balance = (user.balance - bet.amount).max(Decimal::ZERO);
        }
        state.next_ticket_id += 1;
        state.next_transaction_id += 1;
        state.tickets.push(ticket.clone());
        state.transactions.push(transaction);

        Ok(ticket)
    }

    async fn commit_account_transaction(
        &self,
        transaction: NewAccountTransaction,
    ) -> Result<Transaction, ShopError> {
        self.ensure_no_forced_error()?;

        let mut state = self.state()?;

        if !state.users.contains_key(&transaction.user_id) {
            return Err(ShopError::server(anyhow!(
                "user #{} disappeared before commit",
                transaction.user_id,
            )));
        }
        if !matches!(
            transaction.kind,
            TransactionKind::Deposit | TransactionKind::Withdrawal
        ) {
            return Err(ShopError::server(anyhow!(
                "{} transactions must be committed together with their ticket",
                transaction.kind,
            )));
        }

        let persisted = Transaction {
            id: state.next_transaction_id,
            user_id: transaction.user_id,
            kind: transaction.kind,
            ticket_id: None,
            time: transaction.time,
            amount: transaction.amount,
        };

        if let Some(user) = state.users.get_mut(&transaction.user_id) {
            if transaction.kind.is_credit() {
                user.balance += transaction.amount;
            } else {
                user.balance -= transaction.amount;
            }
        }
        state.next_transaction_id += 1;
        state.transactions.push(persisted.clone());

        Ok(persisted)
    }

    async fn offer_events(&self) -> Result<Vec<Event>, ShopError> {
        self.ensure_no_forced_error()?;
        Ok(self.state()?.events.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
