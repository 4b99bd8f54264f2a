//! # Domain Errors
//!
//! Error types for the Storage Helper, one enum per layer:
//!
//! - [`ContextError`]: the caller cancelled or the deadline passed
//! - [`NodeError`]: the data-source node rejected or failed a request
//! - [`AssertionError`]: a value broke the validation ruleset
//! - [`FetchError`]: the balance-retrieval protocol failed
//! - [`StorageHelperError`]: what the reconciliation engine sees
//! - [`ConfigError`]: configuration could not be loaded
//!
//! Wrapping variants leave the cause out of their message and expose it
//! through `source()`.

use std::path::PathBuf;

use thiserror::Error;

/// Caller-side cancellation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The caller cancelled the context.
    #[error("context cancelled")]
    Cancelled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors reported by a data-source node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// Node is not reachable or not ready to serve.
    #[error("Node unavailable: {0}")]
    Unavailable(String),

    /// Transport failure while talking to the node.
    #[error("Network error: {0}")]
    Network(String),

    /// The node did not answer within the per-request timeout.
    #[error("Request timed out after {after_ms}ms")]
    Timeout {
        /// Timeout that elapsed
        after_ms: u64,
    },

    /// Account is unknown to the node at the requested block.
    #[error("Account not found: {address}")]
    AccountNotFound {
        /// Account address
        address: String,
    },

    /// Requested block is unknown to the node.
    #[error("Block not found")]
    BlockNotFound,

    /// Node-reported error.
    #[error("Node error {code}: {message}")]
    Internal {
        /// Node error code
        code: i32,
        /// Node error message
        message: String,
        /// Whether the node marked the error as retriable
        retriable: bool,
    },
}

impl NodeError {
    /// Whether repeating the same request may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Network(_) | Self::Timeout { .. } => true,
            Self::Internal { retriable, .. } => *retriable,
            Self::AccountNotFound { .. } | Self::BlockNotFound => false,
        }
    }
}

/// Validation ruleset violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
    /// Block hash is empty.
    #[error("Block identifier hash is empty")]
    EmptyBlockHash,

    /// Block index is negative.
    #[error("Block identifier index is negative: {0}")]
    NegativeBlockIndex(i64),

    /// Account address is empty.
    #[error("Account address is empty")]
    EmptyAccountAddress,

    /// Sub-account address is empty.
    #[error("Sub-account address is empty")]
    EmptySubAccountAddress,

    /// Currency symbol is empty.
    #[error("Currency symbol is empty")]
    EmptyCurrencySymbol,

    /// Currency decimals are negative.
    #[error("Currency decimals are negative: {0}")]
    NegativeDecimals(i32),

    /// Amount value is not a signed integer string.
    #[error("Amount value is not an integer: {0:?}")]
    InvalidAmountValue(String),

    /// The same currency appears twice in one balance response.
    #[error("Duplicate currency in balance response: {0}")]
    DuplicateCurrency(String),

    /// Returned block does not match the block that was asked for.
    #[error("Returned block {index}:{hash} does not match the requested block")]
    BlockMismatch {
        /// Returned index
        index: i64,
        /// Returned hash
        hash: String,
    },

    /// Operation type is not in the ruleset.
    #[error("Operation type not supported: {0}")]
    UnsupportedOperationType(String),

    /// Operation status is not in the ruleset.
    #[error("Operation status not supported: {0}")]
    UnsupportedOperationStatus(String),

    /// Operation has no status.
    #[error("Operation status is missing")]
    MissingOperationStatus,

    /// Identifier targets a different network.
    #[error("Network mismatch: expected {expected}, got {got}")]
    NetworkMismatch {
        /// Network of the ruleset
        expected: String,
        /// Network that was presented
        got: String,
    },
}

/// Failures of the balance-retrieval protocol.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retriable node failure.
    #[error("Node request failed")]
    Node(#[from] NodeError),

    /// Request was rejected by the ruleset before it was sent.
    #[error("Invalid balance request")]
    InvalidRequest(#[source] AssertionError),

    /// Node response violated the ruleset.
    #[error("Invalid balance response")]
    InvalidResponse(#[source] AssertionError),

    /// The response does not carry the requested currency.
    #[error("Currency {symbol} not found in balance response")]
    CurrencyNotFound {
        /// Requested currency symbol
        symbol: String,
    },

    /// Retriable failures persisted past the retry budget.
    #[error("Balance request failed after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Last node failure
        #[source]
        last: NodeError,
    },

    /// The caller's context ended the request.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl FetchError {
    /// True if the caller's context ended the request.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Context(_))
    }
}

/// Coarse classification of [`StorageHelperError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageHelperErrorKind {
    /// The remote protocol failed. Fatal to the current reconciliation check only.
    RemoteLookupFailure,
    /// The caller cancelled or timed out the lookup.
    Cancellation,
}

/// Errors returned to the reconciliation engine.
#[derive(Debug, Error)]
pub enum StorageHelperError {
    /// Remote balance lookup failed.
    #[error("unable to get currency balance in storage helper")]
    BalanceLookupFailed {
        /// Protocol failure
        #[source]
        source: FetchError,
    },

    /// Balance lookup was cancelled by the caller.
    #[error("balance lookup in storage helper cancelled")]
    Cancelled {
        /// Cancellation signal
        #[source]
        source: ContextError,
    },
}

impl StorageHelperError {
    /// Error kind tag.
    pub fn kind(&self) -> StorageHelperErrorKind {
        match self {
            Self::BalanceLookupFailed { .. } => StorageHelperErrorKind::RemoteLookupFailure,
            Self::Cancelled { .. } => StorageHelperErrorKind::Cancellation,
        }
    }

    /// True for caller cancellation or deadline expiry.
    pub fn is_cancellation(&self) -> bool {
        self.kind() == StorageHelperErrorKind::Cancellation
    }
}

impl From<FetchError> for StorageHelperError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Context(source) => Self::Cancelled { source },
            source => Self::BalanceLookupFailed { source },
        }
    }
}

impl From<ContextError> for StorageHelperError {
    fn from(source: ContextError) -> Self {
        Self::Cancelled { source }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Failed to read {}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// JSON could not be parsed.
    #[error("Failed to parse configuration")]
    Parse(#[from] serde_json::Error),

    /// The exempt list names the same pair twice.
    #[error("Duplicate exempt account: {address} ({symbol})")]
    DuplicateExemptAccount {
        /// Account address
        address: String,
        /// Currency symbol
        symbol: String,
    },

    /// Configured network differs from the data source's ruleset.
    #[error("Configured network {configured} does not match data source network {data_source}")]
    NetworkMismatch {
        /// Network from the configuration
        configured: String,
        /// Network the data source serves
        data_source: String,
    },

    /// Fetcher settings are inconsistent.
    #[error("Invalid fetcher configuration: {0}")]
    InvalidFetcher(String),
}
