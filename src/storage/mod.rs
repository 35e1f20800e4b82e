//! Persistence seam.
//!
//! The engine never talks to a database directly; it goes through the
//! [`BetStore`] trait and receives already-loaded aggregates. The
//! reference implementation is the in-memory [`MemoryStore`], whose full
//! state can be snapshotted to/from a JSON file. SQLite integration can
//! be added later behind the same trait.

pub mod memory;

pub use memory::{MemoryStore, ShopState};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{
    Event, Selection, ShopError, TaxGrade, Ticket, Transaction, TransactionKind, User,
};

// ---------------------------------------------------------------------------
// Write models
// ---------------------------------------------------------------------------

/// A fully validated bet, constructed by the placement engine and handed
/// to the store for the atomic commit.
#[derive(Debug, Clone)]
pub struct NewBet {
    pub user_id: i32,
    /// Selections in the bettor's input order.
    pub selections: Vec<Selection>,
    pub placed_at: DateTime<Utc>,
    pub amount: Decimal,
    pub total_odds: Decimal,
}

/// A validated deposit or withdrawal, ready to commit.
#[derive(Debug, Clone)]
pub struct NewAccountTransaction {
    pub user_id: i32,
    pub kind: TransactionKind,
    pub time: DateTime<Utc>,
    pub amount: Decimal,
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Abstraction over the sportsbook's persistence collaborator.
///
/// Reads return already-loaded aggregates; the two `commit_*` methods are
/// each one atomic unit of work — either every write in them lands or
/// none does. Infrastructure failures surface as [`ShopError::Server`].
///
/// Note that the trait deliberately specifies no locking or
/// compare-and-swap around the balance: two concurrent placements by one
/// user can both pass the balance check before either commits. This
/// matches the historical behavior; the pay-in debit clamps at zero
/// instead of going negative.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BetStore: Send + Sync {
    /// Fetch a user by id.
    async fn user_by_id(&self, id: i32) -> Result<Option<User>, ShopError>;

    /// Resolve selection ids into time-valid, priced selections.
    ///
    /// Only outcomes whose availability window contains `at` and whose
    /// odds are present appear in the result; missing ids are simply
    /// absent (the evaluator reports them uniformly).
    async fn resolve_selections(
        &self,
        at: DateTime<Utc>,
        selection_ids: &[i32],
    ) -> Result<HashMap<i32, Selection>, ShopError>;

    /// The complete progressive tax schedule.
    async fn tax_grades(&self) -> Result<Vec<TaxGrade>, ShopError>;

    /// Fetch a ticket by id, optionally only if it existed at `state_at`.
    async fn ticket_by_id(
        &self,
        id: i32,
        state_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Ticket>, ShopError>;

    /// Atomically insert the ticket, its pay-in transaction, and the
    /// balance debit. Returns the persisted ticket.
    async fn commit_bet(&self, bet: NewBet) -> Result<Ticket, ShopError>;

    /// Atomically insert a deposit/withdrawal and apply the balance
    /// movement. Returns the persisted transaction.
    async fn commit_account_transaction(
        &self,
        transaction: NewAccountTransaction,
    ) -> Result<Transaction, ShopError>;

    /// All event aggregates, unfiltered; the offer module prunes them to
    /// availability windows.
    async fn offer_events(&self) -> Result<Vec<Event>, ShopError>;
}

// ---------------------------------------------------------------------------
// Snapshot persistence
// ---------------------------------------------------------------------------

/// Default snapshot file path.
const DEFAULT_SNAPSHOT_FILE: &str = "betshop_state.json";

/// Save a store snapshot to a JSON file.
pub fn save_snapshot(state: &ShopState, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(state)
        .context("Failed to serialise shop state")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write snapshot to {path}"))?;

    debug!(path, users = state.users.len(), tickets = state.tickets.len(), "Snapshot saved");
    Ok(())
}

/// Load a store snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<ShopState>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    let state: ShopState = serde_json::from_str(&json)
        .context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        users = state.users.len(),
        events = state.events.len(),
        tickets = state.tickets.len(),
        "Snapshot loaded from disk"
    );

    Ok(Some(state))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
