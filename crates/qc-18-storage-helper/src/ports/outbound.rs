//! # Outbound Ports
//!
//! Traits for external dependencies (the data-source node).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Amount, BlockIdentifier};

use crate::domain::{AccountBalanceRequest, AccountBalanceResponse, NodeError};

/// Data-source node connection - outbound port.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Read an account's balances at a block.
    async fn account_balance(
        &self,
        request: &AccountBalanceRequest,
    ) -> Result<AccountBalanceResponse, NodeError>;

    /// Node identifier (for logging/debugging).
    fn node_id(&self) -> &str;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock node for testing.
///
/// Serves balances per account address. Queued failures are returned first,
/// one per call, then the permanent failure if set.
pub struct MockNodeClient {
    /// Node identifier.
    pub id: String,
    balances: HashMap<String, Vec<Amount>>,
    tip: BlockIdentifier,
    delay: Option<Duration>,
    fail_with: Option<NodeError>,
    queued_failures: Mutex<VecDeque<NodeError>>,
    requests: Mutex<Vec<AccountBalanceRequest>>,
    calls: AtomicUsize,
}

impl Default for MockNodeClient {
    fn default() -> Self {
        Self {
            id: "mock-node-1".to_string(),
            balances: HashMap::new(),
            tip: BlockIdentifier::new(0, "0x0"),
            delay: None,
            fail_with: None,
            queued_failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockNodeClient {
    /// Add a balance for `address`.
    pub fn with_balance(mut self, address: impl Into<String>, amount: Amount) -> Self {
        self.balances.entry(address.into()).or_default().push(amount);
        self
    }

    /// Block reported when a request does not pin one.
    pub fn with_tip(mut self, tip: BlockIdentifier) -> Self {
        self.tip = tip;
        self
    }

    /// Delay every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every call with `err`.
    pub fn failing(mut self, err: NodeError) -> Self {
        self.fail_with = Some(err);
        self
    }

    /// Fail the next calls with `errors`, in order.
    pub fn with_queued_failures(self, errors: Vec<NodeError>) -> Self {
        self.queued_failures.lock().extend(errors);
        self
    }

    /// Number of `account_balance` calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<AccountBalanceRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl NodeClient for MockNodeClient {
    async fn account_balance(
        &self,
        request: &AccountBalanceRequest,
    ) -> Result<AccountBalanceResponse, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.queued_failures.lock().pop_front();
        if let Some(err) = queued {
            return Err(err);
        }
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let address = &request.account_identifier.address;
        let balances = self
            .balances
            .get(address)
            .ok_or_else(|| NodeError::AccountNotFound {
                address: address.clone(),
            })?;

        // Real nodes filter by the requested currencies; match on symbol so
        // metadata drift on the node side is visible to callers.
        let balances = match &request.currencies {
            Some(currencies) => balances
                .iter()
                .filter(|a| currencies.iter().any(|c| c.symbol == a.currency.symbol))
                .cloned()
                .collect(),
            None => balances.clone(),
        };

        let requested = request.requested_block();
        let block_identifier = BlockIdentifier {
            index: requested.index.unwrap_or(self.tip.index),
            hash: requested.hash.unwrap_or_else(|| self.tip.hash.clone()),
        };

        Ok(AccountBalanceResponse {
            block_identifier,
            balances,
            metadata: None,
        })
    }

    fn node_id(&self) -> &str {
        &self.id
    }
}
