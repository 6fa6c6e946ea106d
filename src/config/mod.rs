//! Configuration for the ledger deployer

pub mod rpc;

use crate::contract::DEFAULT_ARTIFACT_PATH;
use crate::driver::ScriptPlan;
use crate::units::EtherAmount;
use crate::{Error, Result};
use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Re-export RPC config
pub use rpc::RpcConfig;

/// First account of the default anvil/hardhat mnemonic
pub const DEV_ACCOUNT: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

/// Settings for the in-process simulated chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Account the simulated wallet exposes
    pub account: Address,
    /// Native value credited to that account before the run
    pub funded_balance: EtherAmount,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            account: DEV_ACCOUNT,
            funded_balance: EtherAmount::from_milliether(10_000_000), // 10,000 ETH like anvil
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compiled Ledger artifact (forge, hardhat or raw hex)
    pub artifact_path: PathBuf,
    /// Amounts used by the script
    pub script: ScriptPlan,
    /// Confirmations to wait for on every transaction
    pub confirmations: u64,
    /// Simulated chain settings
    pub simulation: SimulationSettings,
    /// Path to audit log file
    pub audit_log_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            script: ScriptPlan::default(),
            confirmations: 1,
            simulation: SimulationSettings::default(),
            audit_log_path: Some("ledger-audit.jsonl".to_string()),
        }
    }
}

impl Config {
    /// Load a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.confirmations == 0 {
            return Err(Error::Config(
                "confirmations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    #[test]
    fn test_defaults_match_demo_amounts() {
        let config = Config::default();
        assert_eq!(config.script.deposit, EtherAmount::parse("1.0").unwrap());
        assert_eq!(config.script.withdraw, EtherAmount::parse("0.5").unwrap());
        assert_eq!(config.script.init_balance.wei(), U256::ZERO);
        assert_eq!(config.confirmations, 1);
        assert_eq!(config.artifact_path, PathBuf::from(DEFAULT_ARTIFACT_PATH));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let value = serde_json::json!({
            "script": {
                "init_balance": "100",
                "deposit": "2.5",
                "withdraw": "1"
            }
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(
            parsed.script.init_balance,
            EtherAmount::parse("100").unwrap()
        );
        assert_eq!(parsed.script.deposit, EtherAmount::from_milliether(2_500));
        assert_eq!(parsed.confirmations, 1);
        assert_eq!(parsed.simulation.account, DEV_ACCOUNT);
        assert_eq!(parsed.audit_log_path.as_deref(), Some("ledger-audit.jsonl"));
    }

    #[test]
    fn test_explicit_config() {
        let value = serde_json::json!({
            "artifact_path": "build/Ledger.bin",
            "confirmations": 3,
            "simulation": {
                "account": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "funded_balance": "5"
            },
            "audit_log_path": null
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.artifact_path, PathBuf::from("build/Ledger.bin"));
        assert_eq!(parsed.confirmations, 3);
        assert_eq!(
            parsed.simulation.funded_balance,
            EtherAmount::from_milliether(5_000)
        );
        assert!(parsed.audit_log_path.is_none());
    }

    #[test]
    fn test_invalid_amount_rejected() {
        let value = serde_json::json!({ "script": { "init_balance": "0", "deposit": "lots", "withdraw": "1" } });
        assert!(serde_json::from_value::<Config>(value).is_err());
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "confirmations": 0 }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));

        std::fs::write(&path, r#"{ "confirmations": 2 }"#).unwrap();
        assert_eq!(Config::load(&path).unwrap().confirmations, 2);
    }
}
