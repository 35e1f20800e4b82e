//! Shared types for the BETSHOP engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that storage, offer, and engine
//! modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Sports offer: event → fixture → market → outcome
// ---------------------------------------------------------------------------

/// A sport discipline. `priority` drives offer sorting (lower sorts first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sport {
    pub id: i32,
    pub name: String,
    pub priority: i32,
}

/// Lifecycle status of a sporting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatus {
    Scheduled,
    Live,
    Completed,
    Rescheduled,
    Cancelled,
}

impl EventStatus {
    /// Whether events in this status appear in the public offer.
    /// Rescheduled and cancelled events are hidden until re-staged.
    pub fn is_listable(&self) -> bool {
        !matches!(self, EventStatus::Rescheduled | EventStatus::Cancelled)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Scheduled => write!(f, "Scheduled"),
            EventStatus::Live => write!(f, "Live"),
            EventStatus::Completed => write!(f, "Completed"),
            EventStatus::Rescheduled => write!(f, "Rescheduled"),
            EventStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Attempt to parse a string into an EventStatus (case-insensitive).
impl std::str::FromStr for EventStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(EventStatus::Scheduled),
            "live" => Ok(EventStatus::Live),
            "completed" => Ok(EventStatus::Completed),
            "rescheduled" => Ok(EventStatus::Rescheduled),
            "cancelled" | "canceled" => Ok(EventStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Unknown event status: {s}")),
        }
    }
}

/// A sporting event carrying one or more betting fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub sport: Sport,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: EventStatus,
    pub priority: i32,
    pub fixtures: Vec<Fixture>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, starts {})",
            self.sport.name,
            self.name,
            self.status,
            self.starts_at.format("%Y-%m-%d %H:%M"),
        )
    }
}

/// Offering mode of a fixture (e.g. prematch, live, promoted).
/// Promoted fixtures trigger the promotional-combination rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureKind {
    pub name: String,
    pub is_promoted: bool,
    pub priority: i32,
}

/// A grouping of markets for one event under a particular offering mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub kind: FixtureKind,
    pub available_from: DateTime<Utc>,
    pub available_until: DateTime<Utc>,
    pub markets: Vec<Market>,
}

impl Fixture {
    /// Whether the fixture's availability window contains `at`.
    pub fn is_available(&self, at: DateTime<Utc>) -> bool {
        self.available_from <= at && at < self.available_until
    }
}

/// A betting market within a fixture (e.g. "Winner", "Total goals").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: i32,
    pub name: String,
    /// Market parameter, e.g. the line of an over/under market.
    pub value: Option<String>,
    pub available_from: DateTime<Utc>,
    pub available_until: DateTime<Utc>,
    pub outcomes: Vec<Outcome>,
}

impl Market {
    /// Whether the market's availability window contains `at`.
    pub fn is_available(&self, at: DateTime<Utc>) -> bool {
        self.available_from <= at && at < self.available_until
    }
}

/// A single priced proposition a bettor can choose.
///
/// `odds` of `None` means the outcome is not currently prestaged for
/// betting; such outcomes never resolve into selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub id: i32,
    pub name: String,
    pub value: Option<String>,
    pub odds: Option<Decimal>,
    pub available_from: DateTime<Utc>,
    pub available_until: DateTime<Utc>,
}

impl Outcome {
    /// Whether the outcome's availability window contains `at`.
    pub fn is_available(&self, at: DateTime<Utc>) -> bool {
        self.available_from <= at && at < self.available_until
    }

    /// Usable for betting: available at `at` and carrying a price.
    pub fn is_bettable(&self, at: DateTime<Utc>) -> bool {
        self.is_available(at) && self.odds.is_some()
    }
}

// ---------------------------------------------------------------------------
// Selection — the resolver's flattened view of a bettable outcome
// ---------------------------------------------------------------------------

/// A time-valid, priced outcome together with its chain context.
///
/// Built by the selection resolver from the event→fixture→market→outcome
/// aggregate; tickets snapshot these at placement so later odds changes
/// do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub outcome_id: i32,
    pub event_id: i32,
    pub event_name: String,
    pub market_name: String,
    pub outcome_name: String,
    pub odds: Decimal,
    /// Inherited from the fixture kind of the outcome's chain.
    pub is_promoted: bool,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {}: {} @ {:.2}",
            self.event_name, self.market_name, self.outcome_name, self.odds,
        )
    }
}

// ---------------------------------------------------------------------------
// Ticket & transactions
// ---------------------------------------------------------------------------

/// Ticket lifecycle status. Tickets are created `Active`; all later
/// transitions belong to settlement, which happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Active,
    Rejected,
    Cancelled,
    CashedOut,
    Won,
    Lost,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Active => write!(f, "Active"),
            TicketStatus::Rejected => write!(f, "Rejected"),
            TicketStatus::Cancelled => write!(f, "Cancelled"),
            TicketStatus::CashedOut => write!(f, "Cashed out"),
            TicketStatus::Won => write!(f, "Won"),
            TicketStatus::Lost => write!(f, "Lost"),
        }
    }
}

/// A bet slip: one or more selections, a stake, and the resulting
/// compounded odds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i32,
    pub user_id: i32,
    pub selections: Vec<Selection>,
    pub pay_in_amount: Decimal,
    pub pay_in_time: DateTime<Utc>,
    pub total_odds: Decimal,
    pub status: TicketStatus,
    pub is_resolved: bool,
    pub resolved_time: Option<DateTime<Utc>>,
    pub cost_amount: Option<Decimal>,
    pub win_amount: Option<Decimal>,
    pub pay_out_time: Option<DateTime<Utc>>,
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket #{} [{}] {} selection(s), stake {:.2}, total odds {:.2}",
            self.id,
            self.status,
            self.selections.len(),
            self.pay_in_amount,
            self.total_odds,
        )
    }
}

/// Direction and purpose of a balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    PayIn,
    PayOut,
}

impl TransactionKind {
    /// Whether this kind credits the user's balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionKind::Deposit | TransactionKind::PayOut)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "Deposit"),
            TransactionKind::Withdrawal => write!(f, "Withdrawal"),
            TransactionKind::PayIn => write!(f, "Pay-in"),
            TransactionKind::PayOut => write!(f, "Pay-out"),
        }
    }
}

/// A recorded balance movement, optionally linked to a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i32,
    pub user_id: i32,
    pub kind: TransactionKind,
    pub ticket_id: Option<i32>,
    pub time: DateTime<Utc>,
    pub amount: Decimal,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {:.2} for user #{}",
            self.kind, self.amount, self.user_id,
        )
    }
}

// ---------------------------------------------------------------------------
// Tax schedule
// ---------------------------------------------------------------------------

/// One bracket of the progressive tax schedule applied to gross
/// potential winnings.
///
/// `lower_bound` of `None` means 0; `upper_bound` of `None` means +∞.
/// The schedule as a whole is assumed to be a non-overlapping ascending
/// partition of `[0, ∞)`; the calculator does not enforce this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxGrade {
    pub lower_bound: Option<Decimal>,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered bettor. `balance` is mutated only through committed
/// transactions and pay-ins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub balance: Decimal,
    pub registered_on: DateTime<Utc>,
    pub deactivated_on: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the account existed and was not yet deactivated at `at`.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.registered_on <= at && self.deactivated_on.map_or(true, |d| d > at)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{}) balance {:.2}", self.username, self.id, self.balance)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error taxonomy for BETSHOP.
///
/// Validation failures (`BadInput`, `NotFound`) carry human-readable
/// messages and are surfaced to the caller without wrapping. `Server`
/// deliberately displays an opaque message; the underlying cause stays
/// attached as the error source for logging.
#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("{0}")]
    BadInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error.")]
    Server(#[source] anyhow::Error),

    #[error("The operation was cancelled.")]
    Cancelled,
}

impl ShopError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        ShopError::BadInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ShopError::NotFound(message.into())
    }

    pub fn server(cause: impl Into<anyhow::Error>) -> Self {
        ShopError::Server(cause.into())
    }

    pub fn is_bad_input(&self) -> bool {
        matches!(self, ShopError::BadInput(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ShopError::NotFound(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ShopError::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
