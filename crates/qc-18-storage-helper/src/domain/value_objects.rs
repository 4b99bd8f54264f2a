//! # Domain Value Objects
//!
//! Request/response shapes exchanged with the data-source node.

use serde::{Deserialize, Serialize};
use shared_types::{
    AccountIdentifier, Amount, BlockIdentifier, Currency, Metadata, NetworkIdentifier,
    PartialBlockIdentifier,
};

/// Balance query sent to a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceRequest {
    /// Network to query.
    pub network_identifier: NetworkIdentifier,
    /// Account whose balance is requested.
    pub account_identifier: AccountIdentifier,
    /// Block to read the balance at. `None` reads at the node's tip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_identifier: Option<PartialBlockIdentifier>,
    /// Restrict the response to these currencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currencies: Option<Vec<Currency>>,
}

impl AccountBalanceRequest {
    /// The block the request is pinned to, or the tip.
    pub fn requested_block(&self) -> PartialBlockIdentifier {
        self.block_identifier.clone().unwrap_or_default()
    }
}

/// Balances of one account at one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceResponse {
    /// Block the balances were read at.
    pub block_identifier: BlockIdentifier,
    /// One amount per currency held.
    pub balances: Vec<Amount>,
    /// Node-specific extras (e.g. sequence numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// An operation status and whether it moves funds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    /// Status name as it appears on operations.
    pub status: String,
    /// Whether operations with this status change balances.
    pub successful: bool,
}

impl OperationStatus {
    /// Create an operation status.
    pub fn new(status: impl Into<String>, successful: bool) -> Self {
        Self {
            status: status.into(),
            successful,
        }
    }
}
