//! Data Source Fetcher
//!
//! Connection to the data-source node: sends balance requests through the
//! `NodeClient` port, validates responses with the network's ruleset and
//! retries retriable node failures with bounded exponential backoff.

use std::sync::Arc;

use shared_types::{AccountIdentifier, Currency, NetworkIdentifier, PartialBlockIdentifier};
use tracing::{debug, warn};

use crate::config::FetcherConfig;
use crate::domain::{
    AccountBalanceRequest, AccountBalanceResponse, Asserter, ContextError, FetchError,
    LookupContext, NodeError,
};
use crate::ports::NodeClient;

/// Connection handle to a data source.
pub struct Fetcher {
    client: Arc<dyn NodeClient>,
    asserter: Arc<Asserter>,
    config: FetcherConfig,
}

impl Fetcher {
    /// Create a fetcher. `asserter` is the ruleset the data source announced
    /// when the connection was established.
    pub fn new(client: Arc<dyn NodeClient>, asserter: Arc<Asserter>, config: FetcherConfig) -> Self {
        Self {
            client,
            asserter,
            config,
        }
    }

    /// Ruleset bound to this connection.
    pub fn asserter(&self) -> Arc<Asserter> {
        Arc::clone(&self.asserter)
    }

    /// Retry policy.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Single balance request, validated against the ruleset.
    ///
    /// A per-request timeout surfaces as the retriable
    /// [`NodeError::Timeout`]; only the caller's own context produces
    /// [`FetchError::Context`].
    pub async fn account_balance(
        &self,
        ctx: &LookupContext,
        request: &AccountBalanceRequest,
    ) -> Result<AccountBalanceResponse, FetchError> {
        let requested = request.requested_block();
        self.asserter
            .network_identifier(&request.network_identifier)
            .and_then(|()| self.asserter.partial_block_identifier(&requested))
            .map_err(FetchError::InvalidRequest)?;

        let request_ctx = match self.config.request_timeout() {
            Some(timeout) => ctx.child_with_timeout(timeout),
            None => ctx.clone(),
        };

        let response = match request_ctx.run(self.client.account_balance(request)).await {
            Ok(result) => result?,
            Err(ContextError::DeadlineExceeded) if ctx.err().is_none() => {
                return Err(NodeError::Timeout {
                    after_ms: self.config.request_timeout_ms.unwrap_or_default(),
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        };

        self.asserter
            .account_balance_response(&requested, &response)
            .map_err(FetchError::InvalidResponse)?;
        Ok(response)
    }

    /// Balance request with retries.
    ///
    /// Retriable node errors are retried up to `max_retries` times; the
    /// caller's context is honoured between attempts. Everything else is
    /// returned immediately.
    pub async fn account_balance_retry(
        &self,
        ctx: &LookupContext,
        network: &NetworkIdentifier,
        account: &AccountIdentifier,
        block: Option<PartialBlockIdentifier>,
        currencies: Option<Vec<Currency>>,
    ) -> Result<AccountBalanceResponse, FetchError> {
        let request = AccountBalanceRequest {
            network_identifier: network.clone(),
            account_identifier: account.clone(),
            block_identifier: block,
            currencies,
        };

        let mut attempts: u32 = 0;
        let mut delay = self.config.retry_delay();
        loop {
            attempts += 1;
            match self.account_balance(ctx, &request).await {
                Ok(response) => return Ok(response),
                Err(FetchError::Node(err)) if err.is_retriable() => {
                    if attempts > self.config.max_retries {
                        return Err(FetchError::RetriesExhausted {
                            attempts,
                            last: err,
                        });
                    }
                    warn!(
                        node = self.client.node_id(),
                        account = %account.address,
                        attempt = attempts,
                        error = %err,
                        "[qc-18] Balance request failed, retrying"
                    );
                    ctx.sleep(delay).await?;
                    delay = (delay * 2).min(self.config.max_retry_delay());
                }
                Err(err) => {
                    debug!(
                        node = self.client.node_id(),
                        account = %account.address,
                        error = ?err,
                        "[qc-18] Balance request failed"
                    );
                    return Err(err);
                }
            }
        }
    }
}
