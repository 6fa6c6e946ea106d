//! Ledger Deployer
//!
//! Deploys the Ledger contract and drives a short scripted session against
//! it:
//! - Request account access from the wallet or node
//! - Deploy the contract with an initial balance
//! - Read the balance, deposit, then withdraw
//!
//! The same script runs against a live node (`driver::OnChainDeployer`) or
//! an in-process simulated chain (`ledger::SimulatedDeployer`).
//!
//! # Security Model
//!
//! - Private keys never leave the wallet module and are never logged
//! - Every state-changing contract call is simulated with `eth_call` before
//!   signing
//! - Full audit trail of every script step

pub mod audit;
pub mod config;
pub mod contract;
pub mod driver;
pub mod ledger;
pub mod units;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use audit::AuditLog;
pub use config::{Config, RpcConfig};
pub use driver::{run_script, Deployer, LedgerHandle, ScriptPlan, ScriptReport, TxOutcome};
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerError, LedgerEvent};
pub use units::EtherAmount;
