//! # Exemption Matching
//!
//! Some accounts (mint/burn, fee sinks, inflation pools) have balances that
//! cannot be derived by summing operations. Reconciling them only produces
//! false failures, so they are matched against a fixed list and skipped.
//!
//! Matching is exact structural equality on both the account (including
//! sub-account and metadata) and the currency.

use std::sync::Arc;

use shared_types::{AccountCurrency, AccountIdentifier, Currency, Operation};

use crate::ports::ExemptOperation;

/// True if `(account, currency)` appears in `accounts`.
pub fn contains_account_currency(
    accounts: &[AccountCurrency],
    account: &AccountIdentifier,
    currency: &Currency,
) -> bool {
    accounts
        .iter()
        .any(|entry| &entry.account == account && &entry.currency == currency)
}

/// Fixed, shareable exempt account list.
///
/// Clones share the same list.
#[derive(Clone, Debug)]
pub struct ExemptAccounts {
    accounts: Arc<[AccountCurrency]>,
}

impl ExemptAccounts {
    /// Wrap a list, keeping its order.
    pub fn new(accounts: Vec<AccountCurrency>) -> Self {
        Self {
            accounts: accounts.into(),
        }
    }

    /// An empty list. Nothing is exempt.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True if no entries.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Entries in configuration order.
    pub fn as_slice(&self) -> &[AccountCurrency] {
        &self.accounts
    }

    /// True if `pair` is listed.
    pub fn contains(&self, pair: &AccountCurrency) -> bool {
        contains_account_currency(&self.accounts, &pair.account, &pair.currency)
    }
}

impl ExemptOperation for ExemptAccounts {
    fn is_exempt(&self, op: &Operation) -> bool {
        // An operation without an account or amount touches no balance.
        op.account_currency()
            .is_some_and(|(account, currency)| {
                contains_account_currency(&self.accounts, account, currency)
            })
    }
}
