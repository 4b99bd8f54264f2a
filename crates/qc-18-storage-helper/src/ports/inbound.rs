//! # Inbound Ports
//!
//! Capabilities the reconciliation engine calls on the Storage Helper.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{AccountIdentifier, Amount, BlockIdentifier, Currency, Operation};

use crate::algorithms::ExemptAccounts;
use crate::domain::{Asserter, LookupContext, StorageHelperError};

/// Decides whether an operation's (account, currency) is excluded from
/// reconciliation.
pub trait ExemptOperation: Send + Sync {
    /// True if reconciliation must skip this operation's account.
    fn is_exempt(&self, op: &Operation) -> bool;
}

/// Storage Helper API - inbound port.
#[async_trait]
pub trait StorageHelper: Send + Sync {
    /// Balance of `account` in `currency` as of `block`.
    ///
    /// Used when the engine has no locally tracked balance to start from.
    async fn account_balance(
        &self,
        ctx: &LookupContext,
        account: &AccountIdentifier,
        currency: &Currency,
        block: &BlockIdentifier,
    ) -> Result<Amount, StorageHelperError>;

    /// Validation ruleset of the configured data source.
    fn asserter(&self) -> Arc<Asserter>;

    /// Exemption filter over the configured exempt accounts.
    fn exempt_func(&self) -> ExemptAccounts;
}
