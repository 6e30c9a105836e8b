//! The balance-consistency rules for paying, clearing, reversing and deleting.
//!
//! Every function here is pure: it validates the request, then returns the updated
//! records together with everything that has to be written or removed. Nothing is
//! applied until the caller commits the whole result in one atomic write, so a
//! rejected request never leaves a partial change behind.

use crate::{
    BankAccount, CheckStatus, Obligation, ObligationKind, Owner, Payment, Schedule,
    Transaction, TransactionKind, TransactionSource, CURRENCY_PRECISION,
};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),
    #[error("currency values cannot have more than 2 decimal places")]
    CurrencyPrecision,
    #[error("payment of {amount} exceeds the remaining balance of {remaining}")]
    Overpayment { amount: Decimal, remaining: Decimal },
    #[error("obligation has {0} recorded payments and cannot be deleted without reversing them")]
    DeletionBlocked(usize),
    #[error("the check has already been cleared")]
    CheckAlreadyCleared,
    #[error("a check of {amount} must be cleared in full, got {requested}")]
    PartialCheckClearance { amount: Decimal, requested: Decimal },
    #[error("account '{0}' does not support checks")]
    UnsupportedAccount(String),
    #[error("payment '{0}' does not belong to this obligation")]
    ForeignPayment(String),
    #[error("payment was made from account '{expected}', not '{actual}'")]
    AccountMismatch { expected: String, actual: String },
    #[error("account '{0}' is not available")]
    UnknownAccount(String),
    #[error("reversing {amount} would leave more outstanding than the original {original}")]
    InconsistentHistory { amount: Decimal, original: Decimal },
    #[error("generated transaction '{0}' can only be removed by reversing its payment")]
    GeneratedTransaction(String),
}

/// A request to pay towards (or clear) an obligation
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub paid_at: NaiveDateTime,
    pub payment_id: String,
    pub expense_id: String,
    pub category_id: Option<String>,
}

/// The outcome of `apply_payment`. All of it has to be committed together.
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedPayment {
    pub obligation: Obligation,
    pub account: BankAccount,
    /// The change in the account's balance, always negative
    pub bank_delta: Decimal,
    pub payment: Payment,
    pub expense: Transaction,
}

/// The outcome of `reverse_payment`. All of it has to be committed together.
#[derive(Clone, Debug, PartialEq)]
pub struct ReversedPayment {
    pub obligation: Obligation,
    pub account: BankAccount,
    /// The change in the account's balance, always positive
    pub bank_delta: Decimal,
    pub removed_payment_id: String,
    pub removed_expense_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletionMode {
    /// Refuse to delete an obligation that has payments
    Refuse,
    /// Reverse every payment, then delete
    Cascade,
}

/// What deleting an obligation involves
#[derive(Clone, Debug, PartialEq)]
pub struct DeletionPlan {
    pub obligation_id: String,
    /// Accounts whose balances were restored, in their updated state
    pub accounts: Vec<BankAccount>,
    pub removed_payment_ids: Vec<String>,
    pub removed_expense_ids: Vec<String>,
    /// Sum of all balance changes
    pub restored: Decimal,
}

/// A manually entered income or expense, before it has been assigned to the ledger
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub category_id: Option<String>,
    pub owner: Owner,
    pub date: NaiveDate,
}

/// Check that `amount` is a positive currency value
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }

    if amount.normalize().scale() > CURRENCY_PRECISION {
        return Err(LedgerError::CurrencyPrecision);
    }

    Ok(())
}

/// Pay `request.amount` towards `obligation` from `account`.
///
/// Decrements the remaining amount, advances the installment schedule, debits the
/// account and generates the matching expense. Checks must be pending, cleared in full
/// and drawn on an account that supports checks; clearing marks them as cleared.
pub fn apply_payment(
    obligation: &Obligation,
    account: &BankAccount,
    request: PaymentRequest,
) -> Result<AppliedPayment, LedgerError> {
    let amount = request.amount;
    validate_amount(amount)?;

    let remaining = obligation.remaining_amount();

    if let ObligationKind::Check { status, .. } = obligation.kind {
        if status == CheckStatus::Cleared {
            error!("check {} has already been cleared", obligation.id);
            return Err(LedgerError::CheckAlreadyCleared);
        }
    }

    if amount > remaining {
        error!(
            "payment of {} towards {} exceeds the remaining {}",
            amount, obligation.id, remaining
        );
        return Err(LedgerError::Overpayment { amount, remaining });
    }

    if obligation.is_check() {
        if !account.account_type.supports_checks() {
            error!("account {} cannot clear checks", account.id);
            return Err(LedgerError::UnsupportedAccount(account.id.clone()));
        }
        if amount != remaining {
            error!("check {} must be cleared in full", obligation.id);
            return Err(LedgerError::PartialCheckClearance {
                amount: remaining,
                requested: amount,
            });
        }
    }

    let paid_on = request.paid_at.date();

    let mut updated = obligation.clone();
    updated.set_remaining_amount(remaining - amount);
    match updated.schedule {
        Schedule::InstallmentByCount {
            ref mut paid_installments,
            ..
        } => *paid_installments = Some(paid_installments.unwrap_or(0).saturating_add(1)),
        Schedule::InstallmentByDayOfMonth {
            ref mut last_payment_date,
            ..
        } => *last_payment_date = Some(paid_on),
        Schedule::FixedDate { .. } => {}
    }
    if let ObligationKind::Check { ref mut status, .. } = updated.kind {
        *status = CheckStatus::Cleared;
    }

    let mut account = account.clone();
    account.debit(amount);

    let payment = Payment {
        id: request.payment_id.clone(),
        obligation_id: obligation.id.clone(),
        bank_account_id: account.id.clone(),
        amount,
        paid_at: request.paid_at,
        expense_id: request.expense_id.clone(),
    };

    let expense = Transaction {
        id: request.expense_id,
        kind: TransactionKind::Expense,
        amount,
        description: describe_payment(obligation),
        bank_account_id: account.id.clone(),
        category_id: request.category_id,
        owner: obligation.owner.clone(),
        date: paid_on,
        source: TransactionSource::Generated {
            payment_id: request.payment_id,
        },
    };

    debug!(
        "paid {} towards {}, {} remaining, account {} balance now {}",
        amount,
        obligation.id,
        updated.remaining_amount(),
        account.id,
        account.balance()
    );

    Ok(AppliedPayment {
        obligation: updated,
        account,
        bank_delta: -amount,
        payment,
        expense,
    })
}

/// Undo `payment`: restore the account balance and the obligation's remaining amount,
/// and drop the generated expense.
///
/// `history` is the obligation's full payment history (including `payment`). It's used
/// to rewind day-of-month schedules to the previous payment. A cleared check returns
/// to pending.
pub fn reverse_payment(
    obligation: &Obligation,
    account: &BankAccount,
    payment: &Payment,
    history: &[Payment],
) -> Result<ReversedPayment, LedgerError> {
    if payment.obligation_id != obligation.id {
        error!(
            "payment {} belongs to {}, not {}",
            payment.id, payment.obligation_id, obligation.id
        );
        return Err(LedgerError::ForeignPayment(payment.id.clone()));
    }

    if payment.bank_account_id != account.id {
        return Err(LedgerError::AccountMismatch {
            expected: payment.bank_account_id.clone(),
            actual: account.id.clone(),
        });
    }

    let restored = obligation.remaining_amount() + payment.amount;
    if restored > obligation.amount {
        error!(
            "reversing payment {} would restore {} of an original {}",
            payment.id, restored, obligation.amount
        );
        return Err(LedgerError::InconsistentHistory {
            amount: payment.amount,
            original: obligation.amount,
        });
    }

    let mut updated = obligation.clone();
    updated.set_remaining_amount(restored);
    match updated.schedule {
        Schedule::InstallmentByCount {
            ref mut paid_installments,
            ..
        } => *paid_installments = Some(paid_installments.unwrap_or(0).saturating_sub(1)),
        Schedule::InstallmentByDayOfMonth {
            ref mut last_payment_date,
            ..
        } => {
            *last_payment_date = history
                .iter()
                .filter(|p| p.obligation_id == obligation.id && p.id != payment.id)
                .map(|p| p.paid_at.date())
                .max();
        }
        Schedule::FixedDate { .. } => {}
    }
    if let ObligationKind::Check { ref mut status, .. } = updated.kind {
        *status = CheckStatus::Pending;
    }

    let mut account = account.clone();
    account.credit(payment.amount);

    debug!(
        "reversed payment {} of {}, account {} balance now {}",
        payment.id,
        payment.amount,
        account.id,
        account.balance()
    );

    Ok(ReversedPayment {
        obligation: updated,
        account,
        bank_delta: payment.amount,
        removed_payment_id: payment.id.clone(),
        removed_expense_id: payment.expense_id.clone(),
    })
}

/// Plan the deletion of `obligation`.
///
/// With no payments the obligation never touched a balance, so it's simply removed.
/// Otherwise `mode` must be `Cascade`, in which case every payment is reversed against
/// its account (taken from `accounts`) first.
pub fn delete_obligation(
    obligation: &Obligation,
    payments: &[Payment],
    accounts: &[BankAccount],
    mode: DeletionMode,
) -> Result<DeletionPlan, LedgerError> {
    let payments: Vec<&Payment> = payments
        .iter()
        .filter(|p| p.obligation_id == obligation.id)
        .collect();

    if !payments.is_empty() && mode == DeletionMode::Refuse {
        error!(
            "refusing to delete {} with {} payments",
            obligation.id,
            payments.len()
        );
        return Err(LedgerError::DeletionBlocked(payments.len()));
    }

    let history: Vec<Payment> = payments.iter().map(|p| (*p).clone()).collect();
    let mut current = obligation.clone();
    let mut touched: Vec<BankAccount> = Vec::new();
    let mut plan = DeletionPlan {
        obligation_id: obligation.id.clone(),
        accounts: Vec::new(),
        removed_payment_ids: Vec::new(),
        removed_expense_ids: Vec::new(),
        restored: Decimal::ZERO,
    };

    for payment in payments {
        // Reverse against the latest state of the account if an earlier payment in
        // this plan already touched it.
        let position = touched.iter().position(|a| a.id == payment.bank_account_id);
        let account = match position {
            Some(i) => touched[i].clone(),
            None => accounts
                .iter()
                .find(|a| a.id == payment.bank_account_id)
                .cloned()
                .ok_or_else(|| LedgerError::UnknownAccount(payment.bank_account_id.clone()))?,
        };

        let reversed = reverse_payment(&current, &account, payment, &history)?;

        current = reversed.obligation;
        plan.restored += reversed.bank_delta;
        plan.removed_payment_ids.push(reversed.removed_payment_id);
        plan.removed_expense_ids.push(reversed.removed_expense_id);
        match position {
            Some(i) => touched[i] = reversed.account,
            None => touched.push(reversed.account),
        }
    }

    plan.accounts = touched;

    debug!(
        "deleting {}: {} payments reversed, {} restored",
        obligation.id,
        plan.removed_payment_ids.len(),
        plan.restored
    );

    Ok(plan)
}

/// Record a manual income or expense against `account`
pub fn record_transaction<S: Into<String>>(
    account: &BankAccount,
    id: S,
    draft: TransactionDraft,
) -> Result<(BankAccount, Transaction), LedgerError> {
    validate_amount(draft.amount)?;

    let mut account = account.clone();
    match draft.kind {
        TransactionKind::Income => account.credit(draft.amount),
        TransactionKind::Expense => account.debit(draft.amount),
    }

    let transaction = Transaction {
        id: id.into(),
        kind: draft.kind,
        amount: draft.amount,
        description: draft.description,
        bank_account_id: account.id.clone(),
        category_id: draft.category_id,
        owner: draft.owner,
        date: draft.date,
        source: TransactionSource::Manual,
    };

    Ok((account, transaction))
}

/// Undo a manual transaction's effect on `account`. Generated expenses are refused;
/// they go away with their payment.
pub fn remove_transaction(
    account: &BankAccount,
    transaction: &Transaction,
) -> Result<BankAccount, LedgerError> {
    if transaction.is_generated() {
        error!("transaction {} was generated by a payment", transaction.id);
        return Err(LedgerError::GeneratedTransaction(transaction.id.clone()));
    }

    if transaction.bank_account_id != account.id {
        return Err(LedgerError::AccountMismatch {
            expected: transaction.bank_account_id.clone(),
            actual: account.id.clone(),
        });
    }

    let mut account = account.clone();
    match transaction.kind {
        TransactionKind::Income => account.debit(transaction.amount),
        TransactionKind::Expense => account.credit(transaction.amount),
    }

    Ok(account)
}

fn describe_payment(obligation: &Obligation) -> String {
    match obligation.kind {
        ObligationKind::Check { ref payee, .. } => format!("clearing check to {}", payee),
        ObligationKind::Loan { ref lender } => {
            format!("installment of loan \"{}\" from {}", obligation.title, lender)
        }
        ObligationKind::Debt { ref creditor } => {
            format!("payment of debt \"{}\" to {}", obligation.title, creditor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountType;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn account(id: &str, account_type: AccountType, balance: Decimal) -> BankAccount {
        BankAccount::new(id, "Main", Owner::Shared, account_type, balance)
    }

    fn loan(amount: Decimal) -> Obligation {
        Obligation::new(
            "loan-1",
            ObligationKind::loan("City Bank"),
            "Car",
            amount,
            Owner::member("sara"),
            Schedule::installments(ymd(2024, 1, 15), Some(10)),
        )
    }

    fn check(amount: Decimal) -> Obligation {
        Obligation::new(
            "check-1",
            ObligationKind::check("Acme Builders"),
            "Renovation",
            amount,
            Owner::member("omar"),
            Schedule::FixedDate {
                due_date: ymd(2024, 7, 1),
            },
        )
    }

    fn request(n: u32, amount: Decimal, on: NaiveDate) -> PaymentRequest {
        PaymentRequest {
            amount,
            paid_at: on.and_hms_opt(9, 30, 0).unwrap(),
            payment_id: format!("pay-{}", n),
            expense_id: format!("exp-{}", n),
            category_id: Some("obligations".into()),
        }
    }

    #[test]
    fn validate_amount_rules() {
        assert_eq!(validate_amount(dec!(10.50)), Ok(()));
        assert_eq!(validate_amount(dec!(10.500)), Ok(()));
        assert_eq!(
            validate_amount(Decimal::ZERO),
            Err(LedgerError::InvalidAmount(Decimal::ZERO))
        );
        assert_eq!(
            validate_amount(dec!(-5)),
            Err(LedgerError::InvalidAmount(dec!(-5)))
        );
        assert_eq!(
            validate_amount(dec!(0.001)),
            Err(LedgerError::CurrencyPrecision)
        );
    }

    #[test]
    fn apply_payment_moves_money_together() {
        let o = loan(dec!(5000));
        let a = account("acc-1", AccountType::Savings, dec!(8000));

        let applied = apply_payment(&o, &a, request(1, dec!(500), ymd(2024, 1, 15))).unwrap();

        assert_eq!(applied.obligation.remaining_amount(), dec!(4500));
        assert_eq!(applied.account.balance(), dec!(7500));
        assert_eq!(applied.bank_delta, dec!(-500));
        assert_eq!(applied.obligation.progress(), Some((1, 10)));

        assert_eq!(applied.payment.amount, dec!(500));
        assert_eq!(applied.payment.expense_id, applied.expense.id);
        assert_eq!(applied.expense.kind, TransactionKind::Expense);
        assert_eq!(applied.expense.amount, dec!(500));
        assert_eq!(applied.expense.bank_account_id, "acc-1");
        assert_eq!(applied.expense.owner, Owner::member("sara"));
        assert_eq!(applied.expense.date, ymd(2024, 1, 15));
        assert_eq!(
            applied.expense.description,
            "installment of loan \"Car\" from City Bank"
        );
        assert_eq!(
            applied.expense.source,
            TransactionSource::Generated {
                payment_id: "pay-1".into()
            }
        );
    }

    #[test]
    fn apply_payment_rejects_overpayment() {
        let o = loan(dec!(300));
        let a = account("acc-1", AccountType::Checking, dec!(1000));

        let result = apply_payment(&o, &a, request(1, dec!(300.01), ymd(2024, 1, 15)));
        assert_eq!(
            result.err(),
            Some(LedgerError::Overpayment {
                amount: dec!(300.01),
                remaining: dec!(300)
            })
        );
    }

    #[test]
    fn apply_payment_settles_exactly() {
        let o = loan(dec!(300));
        let a = account("acc-1", AccountType::Checking, dec!(1000));

        let applied = apply_payment(&o, &a, request(1, dec!(300), ymd(2024, 1, 15))).unwrap();
        assert!(applied.obligation.is_settled());

        let again = apply_payment(
            &applied.obligation,
            &applied.account,
            request(2, dec!(1), ymd(2024, 2, 15)),
        );
        assert_eq!(
            again.err(),
            Some(LedgerError::Overpayment {
                amount: dec!(1),
                remaining: Decimal::ZERO
            })
        );
    }

    #[test]
    fn apply_payment_rejects_invalid_amounts() {
        let o = loan(dec!(300));
        let a = account("acc-1", AccountType::Checking, dec!(1000));

        assert_eq!(
            apply_payment(&o, &a, request(1, Decimal::ZERO, ymd(2024, 1, 15))).err(),
            Some(LedgerError::InvalidAmount(Decimal::ZERO))
        );
        assert_eq!(
            apply_payment(&o, &a, request(1, dec!(1.005), ymd(2024, 1, 15))).err(),
            Some(LedgerError::CurrencyPrecision)
        );
    }

    #[test]
    fn clearing_a_check() {
        let c = check(dec!(25000));
        let a = account("acc-1", AccountType::Checking, dec!(100000));

        let applied = apply_payment(&c, &a, request(1, dec!(25000), ymd(2024, 7, 1))).unwrap();

        assert_eq!(applied.account.balance(), dec!(75000));
        assert!(applied.obligation.is_settled());
        assert_eq!(
            applied.obligation.kind,
            ObligationKind::Check {
                payee: "Acme Builders".into(),
                status: CheckStatus::Cleared
            }
        );
        assert_eq!(applied.expense.description, "clearing check to Acme Builders");
        assert_eq!(applied.expense.owner, Owner::member("omar"));
    }

    #[test]
    fn checks_clear_in_full_from_checking_accounts() {
        let c = check(dec!(25000));

        let savings = account("acc-2", AccountType::Savings, dec!(100000));
        assert_eq!(
            apply_payment(&c, &savings, request(1, dec!(25000), ymd(2024, 7, 1))).err(),
            Some(LedgerError::UnsupportedAccount("acc-2".into()))
        );

        let checking = account("acc-1", AccountType::Checking, dec!(100000));
        assert_eq!(
            apply_payment(&c, &checking, request(1, dec!(1000), ymd(2024, 7, 1))).err(),
            Some(LedgerError::PartialCheckClearance {
                amount: dec!(25000),
                requested: dec!(1000)
            })
        );
    }

    #[test]
    fn check_payment_above_face_value_is_an_overpayment() {
        let c = check(dec!(25000));
        let a = account("acc-1", AccountType::Checking, dec!(100000));

        assert_eq!(
            apply_payment(&c, &a, request(1, dec!(30000), ymd(2024, 7, 1))).err(),
            Some(LedgerError::Overpayment {
                amount: dec!(30000),
                remaining: dec!(25000)
            })
        );
    }

    #[test]
    fn cleared_check_cannot_clear_again() {
        let mut c = check(dec!(250));
        c.kind = ObligationKind::Check {
            payee: "Acme Builders".into(),
            status: CheckStatus::Cleared,
        };
        let a = account("acc-1", AccountType::Checking, dec!(1000));

        assert_eq!(
            apply_payment(&c, &a, request(1, dec!(250), ymd(2024, 7, 1))).err(),
            Some(LedgerError::CheckAlreadyCleared)
        );
    }

    #[test]
    fn apply_then_reverse_restores_everything() {
        let o = loan(dec!(5000));
        let a = account("acc-1", AccountType::Checking, dec!(8000));

        let applied = apply_payment(&o, &a, request(1, dec!(500), ymd(2024, 1, 15))).unwrap();
        let history = vec![applied.payment.clone()];
        let reversed = reverse_payment(
            &applied.obligation,
            &applied.account,
            &applied.payment,
            &history,
        )
        .unwrap();

        assert_eq!(reversed.obligation, o);
        assert_eq!(reversed.account, a);
        assert_eq!(reversed.bank_delta, dec!(500));
        assert_eq!(reversed.removed_payment_id, "pay-1");
        assert_eq!(reversed.removed_expense_id, "exp-1");
    }

    #[test]
    fn reversing_a_cleared_check_makes_it_pending() {
        let c = check(dec!(25000));
        let a = account("acc-1", AccountType::Checking, dec!(100000));

        let applied = apply_payment(&c, &a, request(1, dec!(25000), ymd(2024, 7, 1))).unwrap();
        let reversed = reverse_payment(
            &applied.obligation,
            &applied.account,
            &applied.payment,
            &[applied.payment.clone()],
        )
        .unwrap();

        assert_eq!(reversed.obligation, c);
        assert_eq!(reversed.account.balance(), dec!(100000));
    }

    #[test]
    fn reversing_rewinds_day_of_month_schedule() {
        let debt = Obligation::new(
            "debt-1",
            ObligationKind::debt("Omar"),
            "Rent share",
            dec!(900),
            Owner::Shared,
            Schedule::monthly_on(ymd(2024, 1, 1), 5),
        );
        let a = account("acc-1", AccountType::Cash, dec!(2000));

        let first = apply_payment(&debt, &a, request(1, dec!(300), ymd(2024, 1, 5))).unwrap();
        let second = apply_payment(
            &first.obligation,
            &first.account,
            request(2, dec!(300), ymd(2024, 2, 5)),
        )
        .unwrap();
        assert_eq!(
            second.obligation.schedule,
            Schedule::InstallmentByDayOfMonth {
                start_date: Some(ymd(2024, 1, 1)),
                payment_day: Some(5),
                last_payment_date: Some(ymd(2024, 2, 5)),
            }
        );

        let history = vec![first.payment.clone(), second.payment.clone()];
        let reversed =
            reverse_payment(&second.obligation, &second.account, &second.payment, &history)
                .unwrap();
        assert_eq!(reversed.obligation, first.obligation);
        assert_eq!(reversed.account.balance(), dec!(1700));
    }

    #[test]
    fn reverse_rejects_foreign_and_mismatched_payments() {
        let o = loan(dec!(5000));
        let a = account("acc-1", AccountType::Checking, dec!(8000));
        let applied = apply_payment(&o, &a, request(1, dec!(500), ymd(2024, 1, 15))).unwrap();

        let mut foreign = applied.payment.clone();
        foreign.obligation_id = "loan-2".into();
        assert_eq!(
            reverse_payment(&applied.obligation, &applied.account, &foreign, &[]).err(),
            Some(LedgerError::ForeignPayment("pay-1".into()))
        );

        let other = account("acc-9", AccountType::Checking, dec!(0));
        assert_eq!(
            reverse_payment(&applied.obligation, &other, &applied.payment, &[]).err(),
            Some(LedgerError::AccountMismatch {
                expected: "acc-1".into(),
                actual: "acc-9".into()
            })
        );

        // The obligation never had this payment applied
        assert_eq!(
            reverse_payment(&o, &a, &applied.payment, &[]).err(),
            Some(LedgerError::InconsistentHistory {
                amount: dec!(500),
                original: dec!(5000)
            })
        );
    }

    #[test]
    fn delete_unpaid_obligation() {
        let o = loan(dec!(5000));
        let plan = delete_obligation(&o, &[], &[], DeletionMode::Refuse).unwrap();

        assert_eq!(plan.obligation_id, "loan-1");
        assert!(plan.accounts.is_empty());
        assert!(plan.removed_payment_ids.is_empty());
        assert_eq!(plan.restored, Decimal::ZERO);
    }

    #[test]
    fn delete_paid_obligation_is_blocked() {
        let o = loan(dec!(5000));
        let a = account("acc-1", AccountType::Checking, dec!(8000));
        let applied = apply_payment(&o, &a, request(1, dec!(500), ymd(2024, 1, 15))).unwrap();

        let result = delete_obligation(
            &applied.obligation,
            &[applied.payment],
            &[applied.account],
            DeletionMode::Refuse,
        );
        assert_eq!(result.err(), Some(LedgerError::DeletionBlocked(1)));
    }

    #[test]
    fn cascade_delete_reverses_every_payment() {
        let o = loan(dec!(5000));
        let a = account("acc-1", AccountType::Checking, dec!(8000));
        let b = account("acc-2", AccountType::Savings, dec!(3000));

        let p1 = apply_payment(&o, &a, request(1, dec!(500), ymd(2024, 1, 15))).unwrap();
        let p2 =
            apply_payment(&p1.obligation, &b, request(2, dec!(700), ymd(2024, 2, 15))).unwrap();
        let p3 = apply_payment(
            &p2.obligation,
            &p1.account,
            request(3, dec!(250.50), ymd(2024, 3, 15)),
        )
        .unwrap();

        let payments = vec![p1.payment, p2.payment, p3.payment];
        let accounts = vec![p3.account, p2.account];
        let plan =
            delete_obligation(&p3.obligation, &payments, &accounts, DeletionMode::Cascade).unwrap();

        assert_eq!(plan.restored, dec!(1450.50));
        assert_eq!(plan.removed_payment_ids, vec!["pay-1", "pay-2", "pay-3"]);
        assert_eq!(plan.removed_expense_ids, vec!["exp-1", "exp-2", "exp-3"]);
        assert_eq!(plan.accounts.len(), 2);
        assert_eq!(plan.accounts[0].id, "acc-1");
        assert_eq!(plan.accounts[0].balance(), dec!(8000));
        assert_eq!(plan.accounts[1].id, "acc-2");
        assert_eq!(plan.accounts[1].balance(), dec!(3000));
    }

    #[test]
    fn cascade_delete_needs_every_account() {
        let o = loan(dec!(5000));
        let a = account("acc-1", AccountType::Checking, dec!(8000));
        let applied = apply_payment(&o, &a, request(1, dec!(500), ymd(2024, 1, 15))).unwrap();

        let result = delete_obligation(
            &applied.obligation,
            &[applied.payment],
            &[],
            DeletionMode::Cascade,
        );
        assert_eq!(result.err(), Some(LedgerError::UnknownAccount("acc-1".into())));
    }

    #[test]
    fn manual_transactions_move_the_balance() {
        let a = account("acc-1", AccountType::Checking, dec!(100));
        let draft = TransactionDraft {
            kind: TransactionKind::Income,
            amount: dec!(2500),
            description: "Salary".into(),
            category_id: Some("salary".into()),
            owner: Owner::member("sara"),
            date: ymd(2024, 6, 1),
        };

        let (a, t) = record_transaction(&a, "tx-1", draft).unwrap();
        assert_eq!(a.balance(), dec!(2600));
        assert_eq!(t.source, TransactionSource::Manual);

        let a = remove_transaction(&a, &t).unwrap();
        assert_eq!(a.balance(), dec!(100));
    }

    #[test]
    fn generated_expenses_cannot_be_removed_directly() {
        let o = loan(dec!(5000));
        let a = account("acc-1", AccountType::Checking, dec!(8000));
        let applied = apply_payment(&o, &a, request(1, dec!(500), ymd(2024, 1, 15))).unwrap();

        assert_eq!(
            remove_transaction(&applied.account, &applied.expense).err(),
            Some(LedgerError::GeneratedTransaction("exp-1".into()))
        );
    }
}
