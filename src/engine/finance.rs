//! Ticket financial math — stake deduction, potential winnings, and the
//! progressive winnings tax.
//!
//! Everything here is a pure function over already-known ticket figures;
//! the same code runs at placement (to validate) and on demand (to report
//! the financial breakdown of an existing ticket).
//!
//! Every monetary figure is rounded to two decimals at the point of
//! computation, not only at the end: the rounded gross amount is what
//! falls into the tax brackets, so intermediate rounding is load-bearing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::TaxGrade;

use super::{round_money, MANIPULATIVE_COST_RATE};

// ---------------------------------------------------------------------------
// Financial breakdown
// ---------------------------------------------------------------------------

/// The complete financial breakdown of a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFinancialAmounts {
    pub pay_in_amount: Decimal,
    pub active_amount: Decimal,
    pub total_odds: Decimal,
    pub gross_potential_win_amount: Decimal,
    pub tax: Decimal,
    pub net_potential_win_amount: Decimal,
}

impl fmt::Display for TicketFinancialAmounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pay-in {:.2} | active {:.2} | odds {:.2} | gross {:.2} | tax {:.2} | net {:.2}",
            self.pay_in_amount,
            self.active_amount,
            self.total_odds,
            self.gross_potential_win_amount,
            self.tax,
            self.net_potential_win_amount,
        )
    }
}

// ---------------------------------------------------------------------------
// Calculators
// ---------------------------------------------------------------------------

/// Stake remaining after the house-margin deduction.
pub fn calculate_active_amount(pay_in_amount: Decimal) -> Decimal {
    round_money((Decimal::ONE - MANIPULATIVE_COST_RATE) * pay_in_amount)
}

/// Gross potential winnings: total odds applied to the active amount.
pub fn calculate_gross_potential_win_amount(
    pay_in_amount: Decimal,
    total_odds: Decimal,
) -> Decimal {
    round_money(total_odds * calculate_active_amount(pay_in_amount))
}

/// Progressive (marginal) tax on a gross amount.
///
/// Grade order does not matter. A grade contributes nothing when the
/// amount is below its lower bound; otherwise it taxes the slice of the
/// amount falling inside its `[lower_bound, upper_bound)` range. An
/// absent lower bound means 0, an absent upper bound means unbounded.
pub fn calculate_tax(tax_grades: &[TaxGrade], amount: Decimal) -> Decimal {
    let mut tax = Decimal::ZERO;

    for grade in tax_grades {
        if let Some(lower_bound) = grade.lower_bound {
            if amount < lower_bound {
                continue;
            }
        }

        let taxed_amount = amount.min(grade.upper_bound.unwrap_or(amount))
            - grade.lower_bound.unwrap_or(Decimal::ZERO);

        tax += grade.rate * taxed_amount;
    }

    round_money(tax)
}

/// Derive the full financial breakdown of a ticket from its stake and
/// total odds under the given tax schedule.
pub fn calculate_ticket_amounts(
    tax_grades: &[TaxGrade],
    pay_in_amount: Decimal,
    total_odds: Decimal,
) -> TicketFinancialAmounts {
    let active_amount = calculate_active_amount(pay_in_amount);
    let gross_potential_win_amount =
        calculate_gross_potential_win_amount(pay_in_amount, total_odds);
    let tax = calculate_tax(tax_grades, gross_potential_win_amount);
    let net_potential_win_amount = gross_potential_win_amount - tax;

    TicketFinancialAmounts {
        pay_in_amount,
        active_amount,
        total_odds,
        gross_potential_win_amount,
        tax,
        net_potential_win_amount,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
