use crate::{calendar::DateRange, Owner};
use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Income,
    Expense,
}

/// Where a ledger entry came from
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionSource {
    /// Entered by a household member
    Manual,
    /// Created alongside a payment or check clearance, and removed with it
    Generated { payment_id: String },
}

/// An income or expense entry against a bank account.
///
/// `amount` is always positive; `kind` decides which way the balance moved.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub bank_account_id: String,
    pub category_id: Option<String>,
    pub owner: Owner,
    pub date: NaiveDate,
    pub source: TransactionSource,
}

/// Matches zero or more transactions. An empty filter matches everything.
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    category: Option<String>,
    description: Option<Vec<String>>,
    owner: Option<Owner>,
    bank_account_id: Option<String>,
    range: Option<DateRange>,
}

/// Income and expense sums over a set of transactions
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl Transaction {
    pub fn is_generated(&self) -> bool {
        matches!(self.source, TransactionSource::Generated { .. })
    }

    /// The effect this entry had on its account's balance
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

impl TransactionFilter {
    pub fn with_category<S: Into<String>>(&mut self, category: S) -> &mut Self {
        self.category = Some(category.into());
        self
    }

    /// Match transactions whose description contains any of the given fragments
    pub fn with_description<S: Into<String>>(&mut self, description: S) -> &mut Self {
        self.description
            .get_or_insert_with(Vec::new)
            .push(description.into());
        self
    }

    pub fn with_owner(&mut self, owner: Owner) -> &mut Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_account<S: Into<String>>(&mut self, bank_account_id: S) -> &mut Self {
        self.bank_account_id = Some(bank_account_id.into());
        self
    }

    pub fn within(&mut self, range: DateRange) -> &mut Self {
        self.range = Some(range);
        self
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        if let Some(ref category) = self.category {
            if t.category_id.as_ref() != Some(category) {
                return false;
            }
        }

        if let Some(ref fragments) = self.description {
            let description = t.description.to_lowercase();
            if !fragments
                .iter()
                .any(|f| description.contains(&f.to_lowercase()))
            {
                return false;
            }
        }

        if let Some(ref owner) = self.owner {
            if &t.owner != owner {
                return false;
            }
        }

        if let Some(ref account) = self.bank_account_id {
            if &t.bank_account_id != account {
                return false;
            }
        }

        match self.range {
            Some(range) => range.contains(t.date),
            None => true,
        }
    }
}

impl Totals {
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        transactions
            .into_iter()
            .fold(Totals::default(), |mut totals, t| {
                match t.kind {
                    TransactionKind::Income => totals.income += t.amount,
                    TransactionKind::Expense => totals.expense += t.amount,
                }
                totals
            })
    }

    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }
}
