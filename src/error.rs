//! Error types for the ledger deployer

use crate::ledger::LedgerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Ledger rejected call: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("RPC transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("Pending transaction error: {0}")]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),

    #[error("Contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
