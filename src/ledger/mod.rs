//! Ledger contract model
//!
//! A plain in-process rendition of the Ledger contract:
//! - One shared balance pool, any account may deposit or withdraw from it
//! - An owner that can only be cleared, never reassigned
//! - Deposit and Withdraw events recorded in emission order
//!
//! The simulated chain hosts instances of this model; the on-chain driver
//! talks to the Solidity contract in `contracts/Ledger.sol` instead.

mod simulated;

pub use simulated::{SimulatedChain, SimulatedDeployer, SimulatedLedger};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds the Ledger reports
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds: balance is {balance}, requested {requested}")]
    InsufficientFunds { balance: U256, requested: U256 },

    #[error("nothing to withdraw")]
    NothingToWithdraw,

    #[error("caller {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("deposit of {amount} would overflow balance {balance}")]
    BalanceOverflow { balance: U256, amount: U256 },
}

/// Kind of ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventKind {
    Deposit,
    Withdraw,
}

/// An event emitted by a ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub kind: LedgerEventKind,
    pub account: Address,
    pub amount: U256,
}

impl LedgerEvent {
    pub fn deposit(account: Address, amount: U256) -> Self {
        Self {
            kind: LedgerEventKind::Deposit,
            account,
            amount,
        }
    }

    pub fn withdraw(account: Address, amount: U256) -> Self {
        Self {
            kind: LedgerEventKind::Withdraw,
            account,
            amount,
        }
    }
}

/// Outbound value transfer owed to a withdrawing caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub to: Address,
    pub amount: U256,
}

/// The Ledger state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    owner: Address,
    balance: U256,
    events: Vec<LedgerEvent>,
}

impl Ledger {
    /// Create a ledger owned by `owner` holding `init_balance`
    pub fn new(owner: Address, init_balance: U256) -> Self {
        Self {
            owner,
            balance: init_balance,
            events: Vec::new(),
        }
    }

    pub fn balance(&self) -> U256 {
        self.balance
    }

    /// Current owner, `Address::ZERO` once renounced
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Add attached value to the pool
    pub fn deposit(&mut self, caller: Address, value: U256) -> Result<LedgerEvent, LedgerError> {
        let balance = self
            .balance
            .checked_add(value)
            .ok_or(LedgerError::BalanceOverflow {
                balance: self.balance,
                amount: value,
            })?;
        self.balance = balance;

        let event = LedgerEvent::deposit(caller, value);
        self.events.push(event.clone());
        Ok(event)
    }

    /// Take `amount` out of the pool for `caller`
    ///
    /// State is untouched on error. The returned payout must be settled in
    /// the same step as the decrement.
    pub fn withdraw(&mut self, caller: Address, amount: U256) -> Result<Payout, LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        self.events.push(LedgerEvent::withdraw(caller, amount));

        Ok(Payout { to: caller, amount })
    }

    /// Empty the pool into `caller`
    pub fn withdraw_all(&mut self, caller: Address) -> Result<Payout, LedgerError> {
        if self.balance.is_zero() {
            return Err(LedgerError::NothingToWithdraw);
        }
        let amount = std::mem::replace(&mut self.balance, U256::ZERO);
        self.events.push(LedgerEvent::withdraw(caller, amount));

        Ok(Payout { to: caller, amount })
    }

    /// Clear ownership; irreversible
    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), LedgerError> {
        // Once cleared, no caller can match: the zero address never signs.
        if self.owner.is_zero() || caller != self.owner {
            return Err(LedgerError::NotOwner { caller });
        }
        self.owner = Address::ZERO;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const OWNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const OTHER: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");

    fn wei(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn test_new_ledger_reports_initial_balance() {
        for init in [0u64, 1, 100, u64::MAX] {
            let ledger = Ledger::new(OWNER, wei(init));
            assert_eq!(ledger.balance(), wei(init));
            assert_eq!(ledger.owner(), OWNER);
            assert!(ledger.events().is_empty());
        }
    }

    #[test]
    fn test_deposits_accumulate() {
        let mut ledger = Ledger::new(OWNER, wei(7));
        let deposits = [1u64, 20, 300, 0, 4000];
        for (i, d) in deposits.iter().enumerate() {
            let caller = if i % 2 == 0 { OWNER } else { OTHER };
            let event = ledger.deposit(caller, wei(*d)).unwrap();
            assert_eq!(event, LedgerEvent::deposit(caller, wei(*d)));
        }

        let total: u64 = deposits.iter().sum();
        assert_eq!(ledger.balance(), wei(7 + total));
        assert_eq!(ledger.events().len(), deposits.len());
    }

    #[test]
    fn test_deposit_overflow_rejected() {
        let mut ledger = Ledger::new(OWNER, U256::MAX);
        let err = ledger.deposit(OTHER, wei(1)).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow { .. }));
        assert_eq!(ledger.balance(), U256::MAX);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_withdraw_within_balance() {
        let mut ledger = Ledger::new(OWNER, wei(100));
        let payout = ledger.withdraw(OTHER, wei(40)).unwrap();

        assert_eq!(payout, Payout { to: OTHER, amount: wei(40) });
        assert_eq!(ledger.balance(), wei(60));
        assert_eq!(ledger.events(), &[LedgerEvent::withdraw(OTHER, wei(40))]);

        // Exact balance is allowed
        ledger.withdraw(OTHER, wei(60)).unwrap();
        assert_eq!(ledger.balance(), U256::ZERO);
    }

    #[test]
    fn test_withdraw_over_balance_leaves_state_unchanged() {
        let mut ledger = Ledger::new(OWNER, wei(10));
        let before = ledger.clone();

        let err = ledger.withdraw(OTHER, wei(11)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                balance: wei(10),
                requested: wei(11)
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_withdraw_all() {
        let mut empty = Ledger::new(OWNER, U256::ZERO);
        assert_eq!(
            empty.withdraw_all(OWNER).unwrap_err(),
            LedgerError::NothingToWithdraw
        );

        let mut ledger = Ledger::new(OWNER, wei(55));
        let payout = ledger.withdraw_all(OTHER).unwrap();
        assert_eq!(payout.amount, wei(55));
        assert_eq!(payout.to, OTHER);
        assert_eq!(ledger.balance(), U256::ZERO);

        // Drained ledger behaves like an empty one
        assert_eq!(
            ledger.withdraw_all(OTHER).unwrap_err(),
            LedgerError::NothingToWithdraw
        );
    }

    #[test]
    fn test_renounce_ownership_is_terminal() {
        let mut ledger = Ledger::new(OWNER, wei(1));

        assert_eq!(
            ledger.renounce_ownership(OTHER).unwrap_err(),
            LedgerError::NotOwner { caller: OTHER }
        );
        assert_eq!(ledger.owner(), OWNER);

        ledger.renounce_ownership(OWNER).unwrap();
        assert_eq!(ledger.owner(), Address::ZERO);

        for caller in [OWNER, OTHER, Address::ZERO] {
            assert_eq!(
                ledger.renounce_ownership(caller).unwrap_err(),
                LedgerError::NotOwner { caller }
            );
        }
        assert_eq!(ledger.owner(), Address::ZERO);
    }

    #[test]
    fn test_deposit_withdraw_scenario() {
        let mut ledger = Ledger::new(OWNER, wei(100));

        ledger.deposit(OWNER, wei(50)).unwrap();
        assert_eq!(ledger.balance(), wei(150));

        ledger.withdraw(OWNER, wei(30)).unwrap();
        assert_eq!(ledger.balance(), wei(120));

        let err = ledger.withdraw(OWNER, wei(200)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(ledger.balance(), wei(120));
    }
}
