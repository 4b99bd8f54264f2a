//! # Algorithms Module
//!
//! Balance retrieval protocol and exemption matching.

pub mod currency_balance;
pub mod exemption;

pub use currency_balance::{extract_amount, get_currency_balance};
pub use exemption::{contains_account_currency, ExemptAccounts};
