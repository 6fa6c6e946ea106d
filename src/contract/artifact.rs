//! Compiled contract artifacts
//!
//! Accepts the three common shapes of compiler output:
//! - forge: `{"bytecode": {"object": "0x..."}}`
//! - hardhat: `{"bytecode": "0x..."}`
//! - solc `--bin`: a file holding only the hex string

use crate::{Error, Result};
use alloy::hex;
use alloy::primitives::Bytes;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where `forge build` puts the Ledger artifact
pub const DEFAULT_ARTIFACT_PATH: &str = "out/Ledger.sol/Ledger.json";

/// Creation bytecode loaded from disk
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytecode: Bytes,
}

impl Artifact {
    /// Load creation bytecode from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Artifact(format!(
                "Cannot read {}: {}. Compile contracts/Ledger.sol first (e.g. `forge build`).",
                path.display(),
                e
            ))
        })?;

        let bytecode = Self::parse(&content)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            path = %path.display(),
            size = bytecode.len(),
            "Loaded contract bytecode"
        );

        Ok(Self {
            path: path.to_path_buf(),
            bytecode,
        })
    }

    /// Extract creation bytecode from artifact text
    pub fn parse(content: &str) -> std::result::Result<Bytes, String> {
        let trimmed = content.trim();
        let hex_str = if trimmed.starts_with('{') {
            let json: Value =
                serde_json::from_str(trimmed).map_err(|e| format!("invalid JSON: {}", e))?;
            let bytecode = json
                .get("bytecode")
                .ok_or_else(|| "missing `bytecode` field".to_string())?;
            match bytecode {
                Value::String(s) => s.clone(),
                Value::Object(obj) => obj
                    .get("object")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "missing `bytecode.object` field".to_string())?
                    .to_string(),
                _ => return Err("unexpected `bytecode` type".to_string()),
            }
        } else {
            trimmed.to_string()
        };

        let hex_str = hex_str.strip_prefix("0x").unwrap_or(&hex_str);
        if hex_str.is_empty() {
            return Err("bytecode is empty (abstract contract or interface?)".to_string());
        }
        hex::decode(hex_str)
            .map(Bytes::from)
            .map_err(|e| format!("invalid bytecode hex: {}", e))
    }
}
