//! Signer and account access
//!
//! Accounts come from one of two places:
//! - a local private key held by [`SecureWallet`]; the key never leaves it
//! - the node itself, asked through `eth_requestAccounts`

mod access;
mod signer;

pub use access::{request_accounts, REQUEST_ACCOUNTS_METHOD};
pub use signer::{SecureWallet, PRIVATE_KEY_ENV};
