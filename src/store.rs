//! Persistence seam. The ledger rules never touch a store directly; `Household` reads
//! records through `Store`, runs the rules, and commits the outcome as one batch.

use crate::{BankAccount, Obligation, Payment, Transaction};
use log::{debug, error, trace};
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Accounts,
    Obligations,
    Payments,
    Transactions,
}

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("{collection} document '{id}' does not exist")]
    Missing { collection: Collection, id: String },
    #[error("store is unavailable: {0}")]
    Unavailable(String),
}

/// A single document write within a `WriteBatch`
#[derive(Clone, Debug, PartialEq)]
pub enum Write {
    PutAccount(BankAccount),
    PutObligation(Obligation),
    DeleteObligation(String),
    PutPayment(Payment),
    DeletePayment(String),
    PutTransaction(Transaction),
    DeleteTransaction(String),
}

/// A group of writes that must be applied all together or not at all
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

/// Document storage for one household ("family").
///
/// Reads return `Ok(None)` for missing documents. `commit` must be atomic: either
/// every write in the batch is applied, or the store is left exactly as it was and
/// an error is returned.
pub trait Store {
    /// The namespace all of this store's documents live under
    fn family(&self) -> &str;

    /// Generate a fresh document id for `collection`
    fn next_id(&mut self, collection: Collection) -> String;

    fn account(&self, id: &str) -> Result<Option<BankAccount>, StoreError>;

    fn obligation(&self, id: &str) -> Result<Option<Obligation>, StoreError>;

    fn obligations(&self) -> Result<Vec<Obligation>, StoreError>;

    fn payment(&self, id: &str) -> Result<Option<Payment>, StoreError>;

    /// All payments for an obligation, oldest first
    fn payments_for(&self, obligation_id: &str) -> Result<Vec<Payment>, StoreError>;

    fn transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError>;

    fn transactions(&self) -> Result<Vec<Transaction>, StoreError>;

    fn commit(&mut self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// An in-process `Store`, used by tests and embedders that keep everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    family: String,
    counters: BTreeMap<Collection, u64>,
    accounts: BTreeMap<String, BankAccount>,
    obligations: BTreeMap<String, Obligation>,
    payments: BTreeMap<String, Payment>,
    transactions: BTreeMap<String, Transaction>,
    // When set, the next commit fails with this reason
    fail_next_commit: Option<String>,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Collection::Accounts => "accounts",
            Collection::Obligations => "obligations",
            Collection::Payments => "payments",
            Collection::Transactions => "transactions",
        };
        f.write_str(name)
    }
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Write> {
        self.writes.iter()
    }
}

impl IntoIterator for WriteBatch {
    type Item = Write;
    type IntoIter = std::vec::IntoIter<Write>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

impl MemoryStore {
    pub fn new<S: Into<String>>(family: S) -> Self {
        MemoryStore {
            family: family.into(),
            ..Self::default()
        }
    }

    /// Make the next `commit` fail as if the backend were unreachable
    pub fn fail_next_commit<S: Into<String>>(&mut self, reason: S) {
        self.fail_next_commit = Some(reason.into());
    }

    pub fn accounts(&self) -> Vec<BankAccount> {
        self.accounts.values().cloned().collect()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.payments.values().cloned().collect()
    }
}

impl Store for MemoryStore {
    fn family(&self) -> &str {
        &self.family
    }

    fn next_id(&mut self, collection: Collection) -> String {
        let counter = self.counters.entry(collection).or_insert(0);
        *counter += 1;
        format!("{}-{}", collection, counter)
    }

    fn account(&self, id: &str) -> Result<Option<BankAccount>, StoreError> {
        Ok(self.accounts.get(id).cloned())
    }

    fn obligation(&self, id: &str) -> Result<Option<Obligation>, StoreError> {
        Ok(self.obligations.get(id).cloned())
    }

    fn obligations(&self) -> Result<Vec<Obligation>, StoreError> {
        Ok(self.obligations.values().cloned().collect())
    }

    fn payment(&self, id: &str) -> Result<Option<Payment>, StoreError> {
        Ok(self.payments.get(id).cloned())
    }

    fn payments_for(&self, obligation_id: &str) -> Result<Vec<Payment>, StoreError> {
        let mut payments: Vec<Payment> = self
            .payments
            .values()
            .filter(|p| p.obligation_id == obligation_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| a.paid_at.cmp(&b.paid_at).then_with(|| a.id.cmp(&b.id)));
        Ok(payments)
    }

    fn transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.transactions.get(id).cloned())
    }

    fn transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.transactions.values().cloned().collect())
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        if let Some(reason) = self.fail_next_commit.take() {
            error!("commit of {} writes failed: {}", batch.len(), reason);
            return Err(StoreError::Unavailable(reason));
        }

        // Stage every write against copies so a failing write leaves nothing applied
        let mut accounts = self.accounts.clone();
        let mut obligations = self.obligations.clone();
        let mut payments = self.payments.clone();
        let mut transactions = self.transactions.clone();

        let count = batch.len();
        for write in batch {
            trace!("[{}] staging {:?}", self.family, write);
            match write {
                Write::PutAccount(a) => {
                    accounts.insert(a.id.clone(), a);
                }
                Write::PutObligation(o) => {
                    obligations.insert(o.id.clone(), o);
                }
                Write::DeleteObligation(id) => {
                    remove(&mut obligations, Collection::Obligations, id)?;
                }
                Write::PutPayment(p) => {
                    payments.insert(p.id.clone(), p);
                }
                Write::DeletePayment(id) => {
                    remove(&mut payments, Collection::Payments, id)?;
                }
                Write::PutTransaction(t) => {
                    transactions.insert(t.id.clone(), t);
                }
                Write::DeleteTransaction(id) => {
                    remove(&mut transactions, Collection::Transactions, id)?;
                }
            }
        }

        self.accounts = accounts;
        self.obligations = obligations;
        self.payments = payments;
        self.transactions = transactions;

        debug!("[{}] committed {} writes", self.family, count);
        Ok(())
    }
}

fn remove<T>(
    documents: &mut BTreeMap<String, T>,
    collection: Collection,
    id: String,
) -> Result<(), StoreError> {
    match documents.remove(&id) {
        Some(_) => Ok(()),
        None => {
            error!("cannot delete missing {} document '{}'", collection, id);
            Err(StoreError::Missing { collection, id })
        }
    }
}
