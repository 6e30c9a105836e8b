use crate::{
    calendar::{today, Period},
    due_date,
    ledger::{
        self, DeletionMode, DeletionPlan, LedgerError, PaymentRequest, ReversedPayment,
        TransactionDraft,
    },
    store::{Collection, Store, StoreError, Write, WriteBatch},
    AccountType, BankAccount, CheckStatus, LedgerConfig, Obligation, ObligationKind, Owner, Payment,
    Schedule, Totals, Transaction, TransactionFilter, CURRENCY_PRECISION,
};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum HouseholdError {
    #[error("{0} document '{1}' does not exist")]
    NotFound(Collection, String),
    #[error("obligation '{0}' is not a check")]
    NotACheck(String),
    #[error("the ledger rejected the operation")]
    Ledger(#[from] LedgerError),
    #[error("the store operation failed")]
    Store(#[from] StoreError),
}

/// An open obligation and when its next payment is due
#[derive(Clone, Debug, PartialEq)]
pub struct Upcoming {
    pub obligation: Obligation,
    pub due_date: NaiveDate,
    pub overdue: bool,
}

/// A household's books, kept in a `Store`.
///
/// Each mutating call reads what it needs, runs the matching rule from
/// [`crate::ledger`] and commits the result as a single batch. Validation failures are
/// returned before anything is written; store failures are returned as they are.
pub struct Household<S> {
    store: S,
    config: LedgerConfig,
}

impl<S: Store> Household<S> {
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Household { store, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn open_account<N: Into<String>>(
        &mut self,
        name: N,
        owner: Owner,
        account_type: AccountType,
        opening_balance: Decimal,
    ) -> Result<BankAccount, HouseholdError> {
        if opening_balance.normalize().scale() > CURRENCY_PRECISION {
            return Err(LedgerError::CurrencyPrecision.into());
        }

        let id = self.store.next_id(Collection::Accounts);
        let account = BankAccount::new(id, name, owner, account_type, opening_balance);

        let mut batch = WriteBatch::new();
        batch.push(Write::PutAccount(account.clone()));
        self.store.commit(batch)?;

        debug!("opened account {} with {}", account.id, opening_balance);
        Ok(account)
    }

    /// Record a new obligation. This never affects a balance; checks always start
    /// out pending.
    pub fn create_obligation<T: Into<String>>(
        &mut self,
        kind: ObligationKind,
        title: T,
        amount: Decimal,
        owner: Owner,
        schedule: Schedule,
    ) -> Result<Obligation, HouseholdError> {
        ledger::validate_amount(amount)?;

        if let ObligationKind::Check {
            status: CheckStatus::Cleared,
            ..
        } = kind
        {
            return Err(LedgerError::CheckAlreadyCleared.into());
        }

        let id = self.store.next_id(Collection::Obligations);
        let obligation = Obligation::new(id, kind, title, amount, owner, schedule);

        let mut batch = WriteBatch::new();
        batch.push(Write::PutObligation(obligation.clone()));
        self.store.commit(batch)?;

        debug!("created obligation {} for {}", obligation.id, amount);
        Ok(obligation)
    }

    pub fn account(&self, id: &str) -> Result<BankAccount, HouseholdError> {
        self.store
            .account(id)?
            .ok_or_else(|| HouseholdError::NotFound(Collection::Accounts, id.into()))
    }

    pub fn obligation(&self, id: &str) -> Result<Obligation, HouseholdError> {
        self.store
            .obligation(id)?
            .ok_or_else(|| HouseholdError::NotFound(Collection::Obligations, id.into()))
    }

    pub fn payments(&self, obligation_id: &str) -> Result<Vec<Payment>, HouseholdError> {
        Ok(self.store.payments_for(obligation_id)?)
    }

    /// Pay `amount` towards an obligation from a bank account
    pub fn pay(
        &mut self,
        obligation_id: &str,
        bank_account_id: &str,
        amount: Decimal,
        paid_at: NaiveDateTime,
    ) -> Result<Payment, HouseholdError> {
        let obligation = self.obligation(obligation_id)?;
        let account = self.account(bank_account_id)?;

        let request = PaymentRequest {
            amount,
            paid_at,
            payment_id: self.store.next_id(Collection::Payments),
            expense_id: self.store.next_id(Collection::Transactions),
            category_id: self.config.generated_expense_category.clone(),
        };
        let applied = ledger::apply_payment(&obligation, &account, request)?;

        let mut batch = WriteBatch::new();
        batch
            .push(Write::PutObligation(applied.obligation))
            .push(Write::PutAccount(applied.account))
            .push(Write::PutPayment(applied.payment.clone()))
            .push(Write::PutTransaction(applied.expense));
        self.store.commit(batch)?;

        Ok(applied.payment)
    }

    /// Clear a pending check in full against a checking account
    pub fn clear_check(
        &mut self,
        check_id: &str,
        bank_account_id: &str,
        cleared_at: NaiveDateTime,
    ) -> Result<Payment, HouseholdError> {
        let check = self.obligation(check_id)?;

        match check.kind {
            ObligationKind::Check {
                status: CheckStatus::Cleared,
                ..
            } => Err(LedgerError::CheckAlreadyCleared.into()),
            ObligationKind::Check { .. } => {
                self.pay(check_id, bank_account_id, check.remaining_amount(), cleared_at)
            }
            _ => Err(HouseholdError::NotACheck(check_id.into())),
        }
    }

    /// Undo a single payment, restoring the balance and removing its expense
    pub fn reverse_payment(&mut self, payment_id: &str) -> Result<ReversedPayment, HouseholdError> {
        let payment = self
            .store
            .payment(payment_id)?
            .ok_or_else(|| HouseholdError::NotFound(Collection::Payments, payment_id.into()))?;
        let obligation = self.obligation(&payment.obligation_id)?;
        let account = self.account(&payment.bank_account_id)?;
        let history = self.store.payments_for(&obligation.id)?;

        let reversed = ledger::reverse_payment(&obligation, &account, &payment, &history)?;

        let mut batch = WriteBatch::new();
        batch
            .push(Write::PutObligation(reversed.obligation.clone()))
            .push(Write::PutAccount(reversed.account.clone()))
            .push(Write::DeletePayment(reversed.removed_payment_id.clone()))
            .push(Write::DeleteTransaction(reversed.removed_expense_id.clone()));
        self.store.commit(batch)?;

        Ok(reversed)
    }

    /// Delete an obligation. With `DeletionMode::Refuse` this fails if anything has
    /// been paid; with `DeletionMode::Cascade` every payment is reversed first.
    pub fn delete_obligation(
        &mut self,
        obligation_id: &str,
        mode: DeletionMode,
    ) -> Result<DeletionPlan, HouseholdError> {
        let obligation = self.obligation(obligation_id)?;
        let payments = self.store.payments_for(obligation_id)?;

        let mut accounts: Vec<BankAccount> = Vec::new();
        for payment in payments.iter() {
            if !accounts.iter().any(|a| a.id == payment.bank_account_id) {
                accounts.push(self.account(&payment.bank_account_id)?);
            }
        }

        let plan = ledger::delete_obligation(&obligation, &payments, &accounts, mode)?;

        let mut batch = WriteBatch::new();
        for account in plan.accounts.iter() {
            batch.push(Write::PutAccount(account.clone()));
        }
        for id in plan.removed_payment_ids.iter() {
            batch.push(Write::DeletePayment(id.clone()));
        }
        for id in plan.removed_expense_ids.iter() {
            batch.push(Write::DeleteTransaction(id.clone()));
        }
        batch.push(Write::DeleteObligation(plan.obligation_id.clone()));
        self.store.commit(batch)?;

        Ok(plan)
    }

    /// Record a manual income or expense
    pub fn record_transaction(
        &mut self,
        bank_account_id: &str,
        draft: TransactionDraft,
    ) -> Result<Transaction, HouseholdError> {
        let account = self.account(bank_account_id)?;
        let id = self.store.next_id(Collection::Transactions);
        let (account, transaction) = ledger::record_transaction(&account, id, draft)?;

        let mut batch = WriteBatch::new();
        batch
            .push(Write::PutAccount(account))
            .push(Write::PutTransaction(transaction.clone()));
        self.store.commit(batch)?;

        Ok(transaction)
    }

    /// Delete a manual transaction and undo its effect on the balance
    pub fn delete_transaction(&mut self, transaction_id: &str) -> Result<(), HouseholdError> {
        let transaction = self.store.transaction(transaction_id)?.ok_or_else(|| {
            HouseholdError::NotFound(Collection::Transactions, transaction_id.into())
        })?;
        let account = self.account(&transaction.bank_account_id)?;
        let account = ledger::remove_transaction(&account, &transaction)?;

        let mut batch = WriteBatch::new();
        batch
            .push(Write::PutAccount(account))
            .push(Write::DeleteTransaction(transaction.id));
        self.store.commit(batch)?;

        Ok(())
    }

    pub fn next_due_date(
        &self,
        obligation_id: &str,
        now: Option<NaiveDate>,
    ) -> Result<Option<NaiveDate>, HouseholdError> {
        let obligation = self.obligation(obligation_id)?;
        let history = self.store.payments_for(obligation_id)?;
        Ok(due_date::next_due_date(&obligation, &history, now))
    }

    /// Every obligation that still has a due date, soonest first
    pub fn upcoming(&self, now: Option<NaiveDate>) -> Result<Vec<Upcoming>, HouseholdError> {
        let now = now.unwrap_or_else(today);

        let mut upcoming = Vec::new();
        for obligation in self.store.obligations()? {
            let history = self.store.payments_for(&obligation.id)?;
            if let Some(due) = due_date::next_due_date(&obligation, &history, Some(now)) {
                upcoming.push(Upcoming {
                    obligation,
                    due_date: due,
                    overdue: due < now,
                });
            }
        }

        upcoming.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.obligation.id.cmp(&b.obligation.id))
        });
        Ok(upcoming)
    }

    /// Transactions matching `filter`, oldest first
    pub fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, HouseholdError> {
        let mut transactions: Vec<Transaction> = self
            .store
            .transactions()?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(transactions)
    }

    /// Income and expense totals for a reporting period
    pub fn totals(&self, period: Period, now: Option<NaiveDate>) -> Result<Totals, HouseholdError> {
        let mut filter = TransactionFilter::default();
        filter.within(period.range(self.config.week_start, now));
        let transactions = self.transactions(&filter)?;
        Ok(Totals::from_transactions(&transactions))
    }
}
