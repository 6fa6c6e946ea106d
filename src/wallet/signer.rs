//! Secure wallet implementation
//!
//! SECURITY: This is the ONLY place where private keys exist.
//! - Keys are held in alloy's PrivateKeySigner which handles crypto securely
//! - Keys are read through `secrecy` and never serialized
//! - Keys are never logged

use crate::{Error, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the deployer's hex private key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Secure wallet that protects private keys
///
/// The private key is:
/// - Stored in alloy's PrivateKeySigner (handles crypto securely)
/// - Never serialized (no Serialize impl)
/// - Only reachable through the EthereumWallet signing interface
pub struct SecureWallet {
    /// Public address (safe to expose)
    address: Address,
    /// Ethereum wallet for alloy integration
    wallet: EthereumWallet,
}

impl SecureWallet {
    /// Create a wallet from an environment variable, `None` if it is unset
    pub fn from_env(var_name: &str) -> Result<Option<Self>> {
        match std::env::var(var_name) {
            Ok(key) => Self::from_secret(&SecretString::from(key)).map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(Error::Wallet(format!("{}: {}", var_name, e))),
        }
    }

    /// Create a wallet from a secret hex-encoded private key
    pub fn from_secret(key: &SecretString) -> Result<Self> {
        Self::from_hex(key.expose_secret())
    }

    /// Create a wallet from a hex-encoded private key
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let key_hex = key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        Ok(Self { address, wallet })
    }

    /// Get the public address (safe to share)
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the address as a checksummed string
    pub fn address_string(&self) -> String {
        self.address.to_checksum(None)
    }

    /// Get a reference to the EthereumWallet for use with alloy providers
    ///
    /// EthereumWallet only exposes signing operations, not the raw key.
    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

// Implement Debug manually to avoid exposing the signer
impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known dev-node key, DO NOT use anywhere real
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_from_hex() {
        let wallet = SecureWallet::from_hex(TEST_KEY).unwrap();

        assert_eq!(
            wallet.address_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_wallet_from_secret_without_prefix() {
        let secret = SecretString::from(TEST_KEY.trim_start_matches("0x").to_string());
        let wallet = SecureWallet::from_secret(&secret).unwrap();
        assert_eq!(
            wallet.address(),
            SecureWallet::from_hex(TEST_KEY).unwrap().address()
        );
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = SecureWallet::from_hex("0x1234").unwrap_err();
        assert!(matches!(err, Error::Wallet(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let wallet = SecureWallet::from_hex(TEST_KEY).unwrap();

        let debug_str = format!("{:?}", wallet);

        assert!(!debug_str.contains("ac0974bec"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_env_unset_is_none() {
        let var = "LEDGER_DEPLOYER_TEST_UNSET_KEY";
        std::env::remove_var(var);
        assert!(SecureWallet::from_env(var).unwrap().is_none());
    }
}
