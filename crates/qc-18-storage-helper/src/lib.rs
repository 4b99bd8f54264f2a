//! # QC-18 Storage Helper
//!
//! Balance reconciliation support for the block indexer.
//!
//! **Subsystem ID:** 18
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! The reconciliation engine compares balances it computes from indexed
//! operations against balances reported by a remote data source. This crate
//! supplies the three things the engine needs from its storage layer:
//!
//! | Capability | Description |
//! |------------|-------------|
//! | `account_balance` | Seed a missing balance, either zero or fetched at a block |
//! | `asserter` | Validation ruleset of the data source's network |
//! | `exempt_func` | Filter for accounts that must not be reconciled |
//!
//! ## Balance Lookup Modes
//!
//! - **Lookup disabled**: the engine synced from genesis and tracks every
//!   balance itself; unseen accounts start at zero with no I/O.
//! - **Lookup by block**: the engine started at an arbitrary height; missing
//!   balances are fetched from the data source pinned to the block's index
//!   and hash.
//!
//! ## Module Structure
//!
//! ```text
//! qc-18-storage-helper/
//! ├── domain/          # Asserter, LookupContext, request/response types, errors
//! ├── algorithms/      # Currency balance protocol, exemption matching
//! ├── ports/           # StorageHelper + ExemptOperation (inbound), NodeClient (outbound)
//! ├── adapters/        # Fetcher (data-source connection with retries)
//! ├── application/     # BlockStorageHelper
//! └── config.rs        # StorageHelperConfig, FetcherConfig, exempt account loading
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::Fetcher;
pub use algorithms::{contains_account_currency, extract_amount, get_currency_balance, ExemptAccounts};
pub use application::BlockStorageHelper;
pub use config::{load_exempt_accounts, FetcherConfig, StorageHelperConfig};
pub use domain::{
    AccountBalanceRequest, AccountBalanceResponse, Asserter, AssertionError, CancelHandle,
    ConfigError, ContextError, FetchError, LookupContext, NodeError, OperationStatus,
    StorageHelperError, StorageHelperErrorKind,
};
pub use ports::{ExemptOperation, MockNodeClient, NodeClient, StorageHelper};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
