//! # Storage Helper Configuration
//!
//! Configuration for the Storage Helper and the data-source fetcher.
//! Captured once at construction; the helper exposes no setters.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::{AccountCurrency, NetworkIdentifier};

use crate::domain::ConfigError;

/// Retry and timeout policy of the balance-retrieval protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Retries after the first attempt for retriable node errors.
    pub max_retries: u32,

    /// Initial backoff between attempts, doubled after each retry.
    pub retry_delay_ms: u64,

    /// Backoff ceiling.
    pub max_retry_delay_ms: u64,

    /// Per-request timeout. `None` relies solely on the caller's context.
    pub request_timeout_ms: Option<u64>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 100,
            max_retry_delay_ms: 5_000,
            request_timeout_ms: Some(30_000),
        }
    }
}

impl FetcherConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 10,
            max_retry_delay_ms: 50,
            request_timeout_ms: Some(1_000),
        }
    }

    /// Initial backoff.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Backoff ceiling.
    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_delay_ms > self.max_retry_delay_ms {
            return Err(ConfigError::InvalidFetcher(format!(
                "retry_delay_ms {} exceeds max_retry_delay_ms {}",
                self.retry_delay_ms, self.max_retry_delay_ms
            )));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidFetcher(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage Helper configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageHelperConfig {
    /// Network every balance lookup targets.
    pub network: NetworkIdentifier,

    /// Fetch missing balances from the data source at the requested block.
    ///
    /// When false, missing balances are seeded as zero. Only correct when
    /// the engine has synced every balance from genesis.
    #[serde(default)]
    pub lookup_balance_by_block: bool,

    /// Accounts excluded from reconciliation, in configuration order.
    #[serde(default)]
    pub exempt_accounts: Vec<AccountCurrency>,

    /// Data-source retry policy.
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

impl StorageHelperConfig {
    /// Create a config for `network` with lookups disabled and no exemptions.
    pub fn new(network: NetworkIdentifier) -> Self {
        Self {
            network,
            lookup_balance_by_block: false,
            exempt_accounts: Vec::new(),
            fetcher: FetcherConfig::default(),
        }
    }

    /// Create a config for testing (local network, fast retries).
    pub fn for_testing() -> Self {
        Self {
            network: NetworkIdentifier::new("quantum-chain", "testnet"),
            lookup_balance_by_block: true,
            exempt_accounts: Vec::new(),
            fetcher: FetcherConfig::for_testing(),
        }
    }

    /// Enable or disable balance lookup by block.
    pub fn with_lookup_balance_by_block(mut self, enabled: bool) -> Self {
        self.lookup_balance_by_block = enabled;
        self
    }

    /// Replace the exempt account list.
    pub fn with_exempt_accounts(mut self, exempt_accounts: Vec<AccountCurrency>) -> Self {
        self.exempt_accounts = exempt_accounts;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Check the exempt list for duplicates and the fetcher policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_unique(&self.exempt_accounts)?;
        self.fetcher.validate()
    }
}

/// Load an exempt account list: a JSON array of
/// `{"account_identifier": ..., "currency": ...}` objects.
pub fn load_exempt_accounts(path: impl AsRef<Path>) -> Result<Vec<AccountCurrency>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let accounts: Vec<AccountCurrency> = serde_json::from_str(&raw)?;
    ensure_unique(&accounts)?;

    tracing::info!(
        path = %path.display(),
        count = accounts.len(),
        "[qc-18] Loaded exempt accounts"
    );
    Ok(accounts)
}

fn ensure_unique(accounts: &[AccountCurrency]) -> Result<(), ConfigError> {
    for (i, entry) in accounts.iter().enumerate() {
        if accounts[..i].contains(entry) {
            return Err(ConfigError::DuplicateExemptAccount {
                address: entry.account.address.clone(),
                symbol: entry.currency.symbol.clone(),
            });
        }
    }
    Ok(())
}
