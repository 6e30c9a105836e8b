//! Household bookkeeping core.
//!
//! Tracks bank accounts, checks, loans and debts for a household, works out when the
//! next installment of each obligation falls due, and keeps account balances, payment
//! history and the transaction ledger consistent whenever something is paid, cleared
//! or reversed.

mod account;
pub mod calendar;
pub mod due_date;
mod household;
pub mod ledger;
mod obligation;
pub mod store;
mod transaction;

use chrono::Weekday;
use std::fmt;

pub use account::{AccountType, BankAccount};
pub use household::{Household, HouseholdError, Upcoming};
pub use obligation::{CheckStatus, Obligation, ObligationKind, Payment, Schedule};
pub use transaction::{Totals, Transaction, TransactionFilter, TransactionKind, TransactionSource};

// This represents the number of decimal places that a currency can validly express.
// @todo Support the full range of currency precisions specified in ISO 4217.
pub const CURRENCY_PRECISION: u32 = 2;

/// The household member (or the household as a whole) that owns an account,
/// obligation or transaction
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    Member(String),
    Shared,
}

/// Settings that shape how the ledger reports and records entries
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    /// The first day of a reporting week
    pub week_start: Weekday,
    /// Category assigned to expenses generated by payments and check clearances
    pub generated_expense_category: Option<String>,
}

impl Owner {
    pub fn member<S: Into<String>>(name: S) -> Self {
        Owner::Member(name.into())
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Member(name) => f.write_str(name),
            Owner::Shared => f.write_str("shared"),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            week_start: calendar::DEFAULT_WEEK_START,
            generated_expense_category: None,
        }
    }
}
