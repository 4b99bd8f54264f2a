//! # Currency Balance Retrieval
//!
//! The remote protocol behind balance lookups: ask the data source for one
//! account's balance in one currency at a (possibly partial) block, then pick
//! that currency out of the response.

use shared_types::{
    AccountIdentifier, Amount, BlockIdentifier, Currency, NetworkIdentifier,
    PartialBlockIdentifier,
};
use tracing::debug;

use crate::adapters::Fetcher;
use crate::domain::{FetchError, LookupContext};

/// Find `currency` in `balances`.
///
/// Prefers an exact match. Nodes do not always echo currency metadata
/// faithfully, so a single entry with the same symbol and decimals is
/// accepted as well. Two such entries are ambiguous and match nothing.
///
/// This is looser than exemption matching
/// ([`contains_account_currency`](crate::algorithms::contains_account_currency)),
/// which requires the currency metadata to match too.
pub fn extract_amount<'a>(balances: &'a [Amount], currency: &Currency) -> Option<&'a Amount> {
    if let Some(exact) = balances.iter().find(|a| &a.currency == currency) {
        return Some(exact);
    }

    let mut loose = balances.iter().filter(|a| {
        a.currency.symbol == currency.symbol && a.currency.decimals == currency.decimals
    });
    match (loose.next(), loose.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Balance of `account` in `currency` at `block`.
///
/// Returns the block the node answered at and the raw value string. The
/// currency reported by the node is not returned.
pub async fn get_currency_balance(
    ctx: &LookupContext,
    fetcher: &Fetcher,
    network: &NetworkIdentifier,
    account: &AccountIdentifier,
    currency: &Currency,
    block: PartialBlockIdentifier,
) -> Result<(BlockIdentifier, String), FetchError> {
    let response = fetcher
        .account_balance_retry(
            ctx,
            network,
            account,
            Some(block),
            Some(vec![currency.clone()]),
        )
        .await?;

    let amount =
        extract_amount(&response.balances, currency).ok_or_else(|| FetchError::CurrencyNotFound {
            symbol: currency.symbol.clone(),
        })?;

    debug!(
        account = %account.address,
        currency = %currency.symbol,
        block_index = response.block_identifier.index,
        "[qc-18] Currency balance retrieved"
    );

    Ok((response.block_identifier.clone(), amount.value.clone()))
}
