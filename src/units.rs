//! Ether amount handling
//!
//! Amounts are written by humans as whole-token decimal strings ("1.0",
//! "0.5") and converted to base units with a fixed 18-decimal scale.

use crate::{Error, Result};
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of decimals between the display unit and base units
pub const ETHER_DECIMALS: u8 = 18;

/// Base units in one whole ether
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// An amount in base units that round-trips through its ether string form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct EtherAmount(U256);

impl EtherAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    /// Wrap a raw base-unit value
    pub const fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    /// Exact amount of `milli` thousandths of an ether
    pub fn from_milliether(milli: u64) -> Self {
        Self(U256::from(milli) * U256::from(WEI_PER_ETHER / 1_000))
    }

    /// Parse a decimal ether string ("1.0" -> 10^18 wei)
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidAmount("empty amount".to_string()));
        }
        if trimmed.starts_with('-') {
            return Err(Error::InvalidAmount(format!("{trimmed}: negative amount")));
        }
        if let Some((_, fraction)) = trimmed.split_once('.') {
            if fraction.len() > ETHER_DECIMALS as usize {
                return Err(Error::InvalidAmount(format!(
                    "{trimmed}: more than {ETHER_DECIMALS} decimal places"
                )));
            }
        }
        parse_ether(trimmed)
            .map(Self)
            .map_err(|e| Error::InvalidAmount(format!("{trimmed}: {e}")))
    }

    /// Value in base units
    pub fn wei(&self) -> U256 {
        self.0
    }
}

impl FromStr for EtherAmount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for EtherAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_ether(self.0))
    }
}

impl From<EtherAmount> for U256 {
    fn from(amount: EtherAmount) -> Self {
        amount.0
    }
}

impl Serialize for EtherAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EtherAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
