//! Revert decoding
//!
//! Nodes report reverts in two ways: structured error data carrying the
//! contract's custom error, or only a message string. Custom errors map onto
//! [`LedgerError`]; everything else keeps the best human-readable reason.

use super::Ledger;
use crate::ledger::LedgerError;
use crate::Error;
use alloy::hex;
use alloy::sol_types::SolInterface;

/// Decode Ledger custom-error revert data
pub fn decode_revert_data(data: &[u8]) -> Option<LedgerError> {
    let decoded = Ledger::LedgerErrors::abi_decode(data).ok()?;
    Some(match decoded {
        Ledger::LedgerErrors::InsufficientFunds(e) => LedgerError::InsufficientFunds {
            balance: e.balance,
            requested: e.amount,
        },
        Ledger::LedgerErrors::NothingToWithdraw(_) => LedgerError::NothingToWithdraw,
        Ledger::LedgerErrors::NotOwner(e) => LedgerError::NotOwner { caller: e.caller },
    })
}

/// Turn a failed contract call into the crate error
pub fn classify_call_error(err: alloy::contract::Error) -> Error {
    if let Some(ledger_error) = err
        .as_revert_data()
        .and_then(|data| decode_revert_data(&data))
    {
        return Error::Ledger(ledger_error);
    }

    let message = err.to_string();
    if message.contains("revert") {
        return Error::Reverted(parse_revert_reason(&message));
    }
    Error::Contract(err)
}

/// Parse revert reason from RPC error message
pub fn parse_revert_reason(error: &str) -> String {
    if error.contains("execution reverted") {
        if let Some(start) = error.find("revert: ") {
            let reason = &error[start + 8..];
            if let Some(end) = reason.find('"') {
                return reason[..end].to_string();
            }
            return reason.to_string();
        }
        if let Some(start) = error.find("0x") {
            let hex_data = &error[start..];
            let end = hex_data
                .find(|c: char| !c.is_ascii_hexdigit() && c != 'x')
                .unwrap_or(hex_data.len());
            let data = &hex_data[..end];

            if let Ok(bytes) = hex::decode(data.trim_start_matches("0x")) {
                if let Some(ledger_error) = decode_revert_data(&bytes) {
                    return ledger_error.to_string();
                }
            }
            // Error(string) selector
            if data.starts_with("0x08c379a0") && data.len() > 138 {
                if let Ok(decoded) = hex::decode(&data[138..]) {
                    let filtered: Vec<u8> = decoded.into_iter().filter(|&b| b != 0).collect();
                    if let Ok(s) = String::from_utf8(filtered) {
                        return s;
                    }
                }
            }
            return format!("Reverted with data: {}", data);
        }
        return "execution reverted".to_string();
    }

    error.to_string()
}
