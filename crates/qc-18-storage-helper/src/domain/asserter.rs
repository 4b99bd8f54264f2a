//! # Validation Ruleset
//!
//! The [`Asserter`] holds the rules a data source announced for its network
//! and checks identifiers, amounts and balance responses against them. It is
//! built once when the connection to the data source is established and is
//! read-only afterwards.

use std::collections::{HashMap, HashSet};

use shared_types::{
    AccountIdentifier, Amount, BlockIdentifier, Currency, NetworkIdentifier, Operation,
    PartialBlockIdentifier,
};

use super::errors::AssertionError;
use super::value_objects::{AccountBalanceResponse, OperationStatus};

/// Validation ruleset bound to a single network.
#[derive(Clone, Debug)]
pub struct Asserter {
    network: NetworkIdentifier,
    operation_types: Vec<String>,
    operation_statuses: HashMap<String, bool>,
    historical_balance_lookup: bool,
}

impl Asserter {
    /// Create a ruleset for `network`.
    pub fn new(
        network: NetworkIdentifier,
        operation_types: Vec<String>,
        operation_statuses: Vec<OperationStatus>,
        historical_balance_lookup: bool,
    ) -> Self {
        let operation_statuses = operation_statuses
            .into_iter()
            .map(|s| (s.status, s.successful))
            .collect();
        Self {
            network,
            operation_types,
            operation_statuses,
            historical_balance_lookup,
        }
    }

    /// Network this ruleset applies to.
    pub fn network(&self) -> &NetworkIdentifier {
        &self.network
    }

    /// Operation types the network emits.
    pub fn operation_types(&self) -> &[String] {
        &self.operation_types
    }

    /// Whether the data source can answer balance queries at past blocks.
    pub fn supports_historical_balance_lookup(&self) -> bool {
        self.historical_balance_lookup
    }

    /// Identifier must target this ruleset's network.
    pub fn network_identifier(&self, network: &NetworkIdentifier) -> Result<(), AssertionError> {
        if network != &self.network {
            return Err(AssertionError::NetworkMismatch {
                expected: format!("{}/{}", self.network.blockchain, self.network.network),
                got: format!("{}/{}", network.blockchain, network.network),
            });
        }
        Ok(())
    }

    /// Full block identifier: non-negative index, non-empty hash.
    pub fn block_identifier(&self, block: &BlockIdentifier) -> Result<(), AssertionError> {
        if block.hash.is_empty() {
            return Err(AssertionError::EmptyBlockHash);
        }
        if block.index < 0 {
            return Err(AssertionError::NegativeBlockIndex(block.index));
        }
        Ok(())
    }

    /// Partial block identifier: whichever fields are set must be valid.
    pub fn partial_block_identifier(
        &self,
        block: &PartialBlockIdentifier,
    ) -> Result<(), AssertionError> {
        if let Some(hash) = &block.hash {
            if hash.is_empty() {
                return Err(AssertionError::EmptyBlockHash);
            }
        }
        if let Some(index) = block.index {
            if index < 0 {
                return Err(AssertionError::NegativeBlockIndex(index));
            }
        }
        Ok(())
    }

    /// Account identifier: non-empty address and sub-account address.
    pub fn account_identifier(&self, account: &AccountIdentifier) -> Result<(), AssertionError> {
        if account.address.is_empty() {
            return Err(AssertionError::EmptyAccountAddress);
        }
        if let Some(sub) = &account.sub_account {
            if sub.address.is_empty() {
                return Err(AssertionError::EmptySubAccountAddress);
            }
        }
        Ok(())
    }

    /// Currency: non-empty symbol, non-negative decimals.
    pub fn currency(&self, currency: &Currency) -> Result<(), AssertionError> {
        if currency.symbol.is_empty() {
            return Err(AssertionError::EmptyCurrencySymbol);
        }
        if currency.decimals < 0 {
            return Err(AssertionError::NegativeDecimals(currency.decimals));
        }
        Ok(())
    }

    /// Amount: value is a signed base-10 integer, currency is valid.
    pub fn amount(&self, amount: &Amount) -> Result<(), AssertionError> {
        let digits = amount
            .value
            .strip_prefix('-')
            .unwrap_or(amount.value.as_str());
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AssertionError::InvalidAmountValue(amount.value.clone()));
        }
        self.currency(&amount.currency)
    }

    /// Operation type must be announced by the network.
    pub fn operation_type(&self, op_type: &str) -> Result<(), AssertionError> {
        if !self.operation_types.iter().any(|t| t == op_type) {
            return Err(AssertionError::UnsupportedOperationType(op_type.to_string()));
        }
        Ok(())
    }

    /// Whether a (settled) operation moved funds.
    pub fn operation_successful(&self, op: &Operation) -> Result<bool, AssertionError> {
        let status = match op.status.as_deref() {
            Some(status) if !status.is_empty() => status,
            _ => return Err(AssertionError::MissingOperationStatus),
        };
        self.operation_statuses
            .get(status)
            .copied()
            .ok_or_else(|| AssertionError::UnsupportedOperationStatus(status.to_string()))
    }

    /// Validate a node's balance response against the block it was asked for.
    ///
    /// The returned block must match every field set in `requested`, and each
    /// currency may appear at most once.
    pub fn account_balance_response(
        &self,
        requested: &PartialBlockIdentifier,
        response: &AccountBalanceResponse,
    ) -> Result<(), AssertionError> {
        self.block_identifier(&response.block_identifier)?;

        let index_matches = requested
            .index
            .map_or(true, |index| index == response.block_identifier.index);
        let hash_matches = requested
            .hash
            .as_ref()
            .map_or(true, |hash| hash == &response.block_identifier.hash);
        if !index_matches || !hash_matches {
            return Err(AssertionError::BlockMismatch {
                index: response.block_identifier.index,
                hash: response.block_identifier.hash.clone(),
            });
        }

        let mut seen = HashSet::new();
        for amount in &response.balances {
            self.amount(amount)?;
            let key = (
                amount.currency.symbol.as_str(),
                amount.currency.decimals,
                amount
                    .currency
                    .metadata
                    .as_ref()
                    .map(|m| serde_json::Value::Object(m.clone()).to_string()),
            );
            if !seen.insert(key) {
                return Err(AssertionError::DuplicateCurrency(
                    amount.currency.symbol.clone(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asserter() -> Asserter {
        Asserter::new(
            NetworkIdentifier::new("bitcoin", "mainnet"),
            vec!["TRANSFER".to_string(), "FEE".to_string()],
            vec![
                OperationStatus::new("SUCCESS", true),
                OperationStatus::new("REVERTED", false),
            ],
            true,
        )
    }

    fn btc() -> Currency {
        Currency::new("BTC", 8)
    }

    #[test]
    fn test_amount_values() {
        let a = asserter();
        assert!(a.amount(&Amount::new("0", btc())).is_ok());
        assert!(a.amount(&Amount::new("-1500", btc())).is_ok());
        assert!(a.amount(&Amount::new("12345678901234567890123", btc())).is_ok());
        assert!(matches!(
            a.amount(&Amount::new("1.5", btc())),
            Err(AssertionError::InvalidAmountValue(_))
        ));
        assert!(a.amount(&Amount::new("", btc())).is_err());
        assert!(a.amount(&Amount::new("-", btc())).is_err());
        assert!(matches!(
            a.amount(&Amount::new("1", Currency::new("", 8))),
            Err(AssertionError::EmptyCurrencySymbol)
        ));
    }

    #[test]
    fn test_block_identifiers() {
        let a = asserter();
        assert!(a.block_identifier(&BlockIdentifier::new(1, "0x1")).is_ok());
        assert_eq!(
            a.block_identifier(&BlockIdentifier::new(1, "")),
            Err(AssertionError::EmptyBlockHash)
        );
        assert_eq!(
            a.block_identifier(&BlockIdentifier::new(-1, "0x1")),
            Err(AssertionError::NegativeBlockIndex(-1))
        );
        assert!(a
            .partial_block_identifier(&PartialBlockIdentifier::default())
            .is_ok());
        assert!(a
            .partial_block_identifier(&PartialBlockIdentifier::at_hash(""))
            .is_err());
    }

    #[test]
    fn test_operation_status() {
        let a = asserter();
        let op = Operation::new(
            0,
            "TRANSFER",
            AccountIdentifier::new("0x1"),
            Amount::new("1", btc()),
        );
        assert_eq!(
            a.operation_successful(&op),
            Err(AssertionError::MissingOperationStatus)
        );
        assert_eq!(
            a.operation_successful(&op.clone().with_status("SUCCESS")),
            Ok(true)
        );
        assert_eq!(
            a.operation_successful(&op.clone().with_status("REVERTED")),
            Ok(false)
        );
        assert!(a
            .operation_successful(&op.with_status("PENDING"))
            .is_err());
        assert!(a.operation_type("FEE").is_ok());
        assert!(a.operation_type("MINT").is_err());
    }

    #[test]
    fn test_network_identifier() {
        let a = asserter();
        assert!(a
            .network_identifier(&NetworkIdentifier::new("bitcoin", "mainnet"))
            .is_ok());
        assert!(matches!(
            a.network_identifier(&NetworkIdentifier::new("bitcoin", "testnet")),
            Err(AssertionError::NetworkMismatch { .. })
        ));
    }

    #[test]
    fn test_balance_response_block_must_match_request() {
        let a = asserter();
        let response = AccountBalanceResponse {
            block_identifier: BlockIdentifier::new(10, "0xa"),
            balances: vec![Amount::new("42", btc())],
            metadata: None,
        };

        let exact = PartialBlockIdentifier::from_block(&BlockIdentifier::new(10, "0xa"));
        assert!(a.account_balance_response(&exact, &response).is_ok());
        assert!(a
            .account_balance_response(&PartialBlockIdentifier::default(), &response)
            .is_ok());
        assert!(a
            .account_balance_response(&PartialBlockIdentifier::at_index(10), &response)
            .is_ok());

        let other_fork = PartialBlockIdentifier::from_block(&BlockIdentifier::new(10, "0xb"));
        assert!(matches!(
            a.account_balance_response(&other_fork, &response),
            Err(AssertionError::BlockMismatch { index: 10, .. })
        ));
    }

    #[test]
    fn test_balance_response_duplicate_currency() {
        let a = asserter();
        let response = AccountBalanceResponse {
            block_identifier: BlockIdentifier::new(10, "0xa"),
            balances: vec![Amount::new("1", btc()), Amount::new("2", btc())],
            metadata: None,
        };
        assert_eq!(
            a.account_balance_response(&PartialBlockIdentifier::default(), &response),
            Err(AssertionError::DuplicateCurrency("BTC".to_string()))
        );
    }
}
