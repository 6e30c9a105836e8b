use crate::Owner;
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountType {
    Checking,
    Savings,
    Cash,
}

/// A bank account (or cash wallet) belonging to a household member.
///
/// The balance can be read freely but only changes through the ledger rules in
/// [`crate::ledger`], which pair every balance movement with a transaction record.
#[derive(Clone, Debug, PartialEq)]
pub struct BankAccount {
    pub id: String,
    pub name: String,
    pub owner: Owner,
    pub account_type: AccountType,
    balance: Decimal,
}

impl AccountType {
    /// Only checking accounts can have checks drawn against them
    pub fn supports_checks(&self) -> bool {
        matches!(self, AccountType::Checking)
    }
}

impl BankAccount {
    pub fn new<I: Into<String>, N: Into<String>>(
        id: I,
        name: N,
        owner: Owner,
        account_type: AccountType,
        balance: Decimal,
    ) -> Self {
        BankAccount {
            id: id.into(),
            name: name.into(),
            owner,
            account_type,
            balance,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub(crate) fn debit(&mut self, amount: Decimal) {
        self.balance -= amount;
    }

    pub(crate) fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
    }
}
