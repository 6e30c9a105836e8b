use crate::Owner;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckStatus {
    Pending,
    Cleared,
}

/// What sort of commitment an `Obligation` is, and who is on the other side of it
#[derive(Clone, Debug, PartialEq)]
pub enum ObligationKind {
    Check { payee: String, status: CheckStatus },
    Loan { lender: String },
    Debt { creditor: String },
}

/// How the due dates of an `Obligation` are worked out.
///
/// Each obligation carries exactly one anchoring, so the resolver never has to pick
/// between two competing formulas for the same schedule.
#[derive(Clone, Debug, PartialEq)]
pub enum Schedule {
    /// A single payment due on a fixed date
    FixedDate { due_date: NaiveDate },
    /// Monthly installments counted from the first installment date
    InstallmentByCount {
        first_installment_date: Option<NaiveDate>,
        // Display only, this never limits how many due dates are produced
        number_of_installments: Option<u32>,
        paid_installments: Option<u32>,
    },
    /// Monthly installments falling on a fixed day of the month
    InstallmentByDayOfMonth {
        start_date: Option<NaiveDate>,
        payment_day: Option<u32>,
        last_payment_date: Option<NaiveDate>,
    },
}

/// A check, loan or debt with an outstanding balance
#[derive(Clone, Debug, PartialEq)]
pub struct Obligation {
    pub id: String,
    pub kind: ObligationKind,
    pub title: String,
    pub amount: Decimal,
    pub owner: Owner,
    pub schedule: Schedule,
    remaining_amount: Decimal,
}

/// An immutable record of money paid towards an `Obligation`.
///
/// Each payment is paired with exactly one generated expense (`expense_id`) that
/// debited `bank_account_id` by `amount`.
#[derive(Clone, Debug, PartialEq)]
pub struct Payment {
    pub id: String,
    pub obligation_id: String,
    pub bank_account_id: String,
    pub amount: Decimal,
    pub paid_at: NaiveDateTime,
    pub expense_id: String,
}

impl ObligationKind {
    pub fn check<S: Into<String>>(payee: S) -> Self {
        ObligationKind::Check {
            payee: payee.into(),
            status: CheckStatus::Pending,
        }
    }

    pub fn loan<S: Into<String>>(lender: S) -> Self {
        ObligationKind::Loan {
            lender: lender.into(),
        }
    }

    pub fn debt<S: Into<String>>(creditor: S) -> Self {
        ObligationKind::Debt {
            creditor: creditor.into(),
        }
    }

    /// The payee, lender or creditor
    pub fn counterparty(&self) -> &str {
        match self {
            ObligationKind::Check { payee, .. } => payee,
            ObligationKind::Loan { lender } => lender,
            ObligationKind::Debt { creditor } => creditor,
        }
    }
}

impl Schedule {
    pub fn installments(first_installment_date: NaiveDate, count: Option<u32>) -> Self {
        Schedule::InstallmentByCount {
            first_installment_date: Some(first_installment_date),
            number_of_installments: count,
            paid_installments: Some(0),
        }
    }

    pub fn monthly_on(start_date: NaiveDate, payment_day: u32) -> Self {
        Schedule::InstallmentByDayOfMonth {
            start_date: Some(start_date),
            payment_day: Some(payment_day),
            last_payment_date: None,
        }
    }
}

impl Obligation {
    /// Create an obligation with nothing paid against it yet
    pub fn new<I: Into<String>, T: Into<String>>(
        id: I,
        kind: ObligationKind,
        title: T,
        amount: Decimal,
        owner: Owner,
        schedule: Schedule,
    ) -> Self {
        Obligation {
            id: id.into(),
            kind,
            title: title.into(),
            amount,
            owner,
            schedule,
            remaining_amount: amount,
        }
    }

    /// Rebuild an obligation read back from storage with its recorded balance
    pub fn with_remaining_amount(mut self, remaining: Decimal) -> Self {
        self.remaining_amount = remaining;
        self
    }

    pub fn remaining_amount(&self) -> Decimal {
        self.remaining_amount
    }

    pub fn paid_amount(&self) -> Decimal {
        self.amount - self.remaining_amount
    }

    pub fn is_settled(&self) -> bool {
        self.remaining_amount == Decimal::ZERO
    }

    pub fn is_check(&self) -> bool {
        matches!(self.kind, ObligationKind::Check { .. })
    }

    /// Returns `(paid, total)` installments for schedules that declare a total
    pub fn progress(&self) -> Option<(u32, u32)> {
        match self.schedule {
            Schedule::InstallmentByCount {
                number_of_installments: Some(total),
                paid_installments,
                ..
            } => Some((paid_installments.unwrap_or(0), total)),
            _ => None,
        }
    }

    pub(crate) fn set_remaining_amount(&mut self, remaining: Decimal) {
        self.remaining_amount = remaining;
    }
}
