//! # Block Storage Helper
//!
//! Application service the reconciliation engine consults while indexing:
//! balance lookups for accounts it has no local history for, the data
//! source's validation ruleset, and the exempt-account filter.
//!
//! All state is captured at construction and never mutated, so one helper
//! can be shared through an `Arc` by any number of concurrent workers.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{
    AccountIdentifier, Amount, BlockIdentifier, Currency, NetworkIdentifier, Operation,
    PartialBlockIdentifier,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::Fetcher;
use crate::algorithms::{get_currency_balance, ExemptAccounts};
use crate::config::StorageHelperConfig;
use crate::domain::{Asserter, ConfigError, LookupContext, StorageHelperError};
use crate::ports::{ExemptOperation, NodeClient, StorageHelper};

fn network_name(network: &NetworkIdentifier) -> String {
    format!("{}/{}", network.blockchain, network.network)
}

/// Block Storage Helper - implements the `StorageHelper` port.
pub struct BlockStorageHelper {
    /// Network all lookups target.
    network: NetworkIdentifier,
    /// Connection to the data source.
    fetcher: Arc<Fetcher>,
    /// Fetch missing balances instead of seeding zero.
    lookup_balance_by_block: bool,
    /// Accounts skipped by reconciliation.
    exempt_accounts: ExemptAccounts,
}

impl BlockStorageHelper {
    /// Create a helper for the data source behind `client`.
    ///
    /// `asserter` is the ruleset the data source announced. The fetcher is
    /// built from `config.fetcher`. Fails if the configuration is invalid or
    /// targets a different network than the ruleset.
    pub fn new(
        config: StorageHelperConfig,
        client: Arc<dyn NodeClient>,
        asserter: Arc<Asserter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if asserter.network() != &config.network {
            return Err(ConfigError::NetworkMismatch {
                configured: network_name(&config.network),
                data_source: network_name(asserter.network()),
            });
        }

        info!(
            network = %config.network.network,
            lookup_balance_by_block = config.lookup_balance_by_block,
            exempt_accounts = config.exempt_accounts.len(),
            "[qc-18] Storage helper ready"
        );

        Ok(Self {
            fetcher: Arc::new(Fetcher::new(client, asserter, config.fetcher)),
            network: config.network,
            lookup_balance_by_block: config.lookup_balance_by_block,
            exempt_accounts: ExemptAccounts::new(config.exempt_accounts),
        })
    }

    /// Configured network.
    pub fn network(&self) -> &NetworkIdentifier {
        &self.network
    }

    /// Whether missing balances are fetched from the data source.
    pub fn lookup_balance_by_block(&self) -> bool {
        self.lookup_balance_by_block
    }

    /// True if reconciliation must skip `op`'s (account, currency).
    pub fn is_exempt(&self, op: &Operation) -> bool {
        self.exempt_accounts.is_exempt(op)
    }
}

#[async_trait]
impl StorageHelper for BlockStorageHelper {
    async fn account_balance(
        &self,
        ctx: &LookupContext,
        account: &AccountIdentifier,
        currency: &Currency,
        block: &BlockIdentifier,
    ) -> Result<Amount, StorageHelperError> {
        if !self.lookup_balance_by_block {
            // Balances are tracked from genesis, so an unseen account is empty.
            return Ok(Amount::zero(currency.clone()));
        }

        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            account = %account.address,
            currency = %currency.symbol,
            block_index = block.index,
            "[qc-18] Looking up balance at block"
        );

        let partial = PartialBlockIdentifier::from_block(block);
        let (_, value) = get_currency_balance(
            ctx,
            &self.fetcher,
            &self.network,
            account,
            currency,
            partial,
        )
        .await
        .map_err(|err| {
            warn!(
                %request_id,
                account = %account.address,
                currency = %currency.symbol,
                block_index = block.index,
                error = ?err,
                "[qc-18] Balance lookup failed"
            );
            StorageHelperError::from(err)
        })?;

        // The requested currency is authoritative over whatever the node echoed.
        Ok(Amount::new(value, currency.clone()))
    }

    fn asserter(&self) -> Arc<Asserter> {
        self.fetcher.asserter()
    }

    fn exempt_func(&self) -> ExemptAccounts {
        self.exempt_accounts.clone()
    }
}
