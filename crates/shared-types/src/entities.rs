//! # Core Identity Entities
//!
//! Value types shared by the indexer, the reconciliation engine and the
//! storage helper. None of these carry behavior beyond structural equality
//! and a handful of constructors.
//!
//! ## Clusters
//!
//! - **Network**: `NetworkIdentifier`, `SubNetworkIdentifier`
//! - **Chain**: `BlockIdentifier`, `PartialBlockIdentifier`
//! - **Accounts & Value**: `AccountIdentifier`, `SubAccountIdentifier`,
//!   `Currency`, `Amount`, `AccountCurrency`
//! - **Operations**: `Operation`, `OperationIdentifier`

use serde::{Deserialize, Serialize};

/// Free-form metadata attached to identifiers.
///
/// Two identifiers that differ only in metadata are different identifiers.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// CLUSTER A: NETWORK
// =============================================================================

/// Identifies the blockchain and network every lookup targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentifier {
    /// Blockchain name (e.g. "bitcoin").
    pub blockchain: String,
    /// Network name (e.g. "mainnet").
    pub network: String,
    /// Optional shard or sub-chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_network_identifier: Option<SubNetworkIdentifier>,
}

impl NetworkIdentifier {
    /// Create a network identifier without a sub-network.
    pub fn new(blockchain: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            blockchain: blockchain.into(),
            network: network.into(),
            sub_network_identifier: None,
        }
    }
}

/// A shard or sub-chain within a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubNetworkIdentifier {
    /// Sub-network name.
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

// =============================================================================
// CLUSTER B: CHAIN
// =============================================================================

/// A fully specified block reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockIdentifier {
    /// Block height.
    pub index: i64,
    /// Block hash, as reported by the node.
    pub hash: String,
}

impl BlockIdentifier {
    /// Create a block identifier.
    pub fn new(index: i64, hash: impl Into<String>) -> Self {
        Self {
            index,
            hash: hash.into(),
        }
    }
}

/// A block reference where index and hash may each be omitted.
///
/// Pinning by index selects a height, pinning by hash selects a fork branch.
/// An empty partial identifier refers to the current tip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialBlockIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl PartialBlockIdentifier {
    /// Build a lookup reference from a full block, keeping both fields.
    pub fn from_block(block: &BlockIdentifier) -> Self {
        Self {
            index: Some(block.index),
            hash: Some(block.hash.clone()),
        }
    }

    /// Reference a block by height only.
    pub fn at_index(index: i64) -> Self {
        Self {
            index: Some(index),
            hash: None,
        }
    }

    /// Reference a block by hash only.
    pub fn at_hash(hash: impl Into<String>) -> Self {
        Self {
            index: None,
            hash: Some(hash.into()),
        }
    }

    /// True when neither index nor hash is set.
    pub fn is_tip(&self) -> bool {
        self.index.is_none() && self.hash.is_none()
    }
}

impl From<&BlockIdentifier> for PartialBlockIdentifier {
    fn from(block: &BlockIdentifier) -> Self {
        Self::from_block(block)
    }
}

impl From<BlockIdentifier> for PartialBlockIdentifier {
    fn from(block: BlockIdentifier) -> Self {
        Self {
            index: Some(block.index),
            hash: Some(block.hash),
        }
    }
}

// =============================================================================
// CLUSTER C: ACCOUNTS & VALUE
// =============================================================================

/// Opaque account identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    /// Account address.
    pub address: String,
    /// Optional sub-account (e.g. staked or locked balance).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_account: Option<SubAccountIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl AccountIdentifier {
    /// Create an account identifier for a plain address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            sub_account: None,
            metadata: None,
        }
    }

    /// Attach a sub-account descriptor.
    pub fn with_sub_account(mut self, address: impl Into<String>) -> Self {
        self.sub_account = Some(SubAccountIdentifier {
            address: address.into(),
            metadata: None,
        });
        self
    }
}

/// Sub-account descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAccountIdentifier {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// A fungible asset type on a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Ticker symbol (e.g. "BTC").
    pub symbol: String,
    /// Number of decimal places in the standard unit.
    pub decimals: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Currency {
    /// Create a currency without metadata.
    pub fn new(symbol: impl Into<String>, decimals: i32) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            metadata: None,
        }
    }
}

/// A value in atomic units paired with its currency.
///
/// `value` is a signed arbitrary-precision integer encoded as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: String,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Amount {
    /// Create an amount.
    pub fn new(value: impl Into<String>, currency: Currency) -> Self {
        Self {
            value: value.into(),
            currency,
            metadata: None,
        }
    }

    /// The zero amount for `currency`.
    pub fn zero(currency: Currency) -> Self {
        Self::new("0", currency)
    }

    /// True if the value is the canonical zero.
    pub fn is_zero(&self) -> bool {
        self.value == "0"
    }
}

/// An (account, currency) pair. Unit of exemption matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCurrency {
    #[serde(rename = "account_identifier")]
    pub account: AccountIdentifier,
    pub currency: Currency,
}

impl AccountCurrency {
    /// Pair an account with a currency.
    pub fn new(account: AccountIdentifier, currency: Currency) -> Self {
        Self { account, currency }
    }
}

// =============================================================================
// CLUSTER D: OPERATIONS
// =============================================================================

/// Position of an operation within its transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationIdentifier {
    pub index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_index: Option<i64>,
}

/// A balance-changing operation observed while indexing a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_identifier: OperationIdentifier,
    /// Network-specific operation type (e.g. "TRANSFER", "FEE").
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Operation {
    /// Create an operation moving `amount` in or out of `account`.
    pub fn new(
        index: i64,
        op_type: impl Into<String>,
        account: AccountIdentifier,
        amount: Amount,
    ) -> Self {
        Self {
            operation_identifier: OperationIdentifier {
                index,
                network_index: None,
            },
            op_type: op_type.into(),
            status: None,
            account: Some(account),
            amount: Some(amount),
            metadata: None,
        }
    }

    /// Set the operation status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// The (account, currency) pair this operation touches, if it has both.
    pub fn account_currency(&self) -> Option<(&AccountIdentifier, &Currency)> {
        match (&self.account, &self.amount) {
            (Some(account), Some(amount)) => Some((account, &amount.currency)),
            _ => None,
        }
    }
}
