//! In-process simulated chain
//!
//! Hosts Ledger instances alongside native account balances so the script
//! can run without a node. Every call is applied to staged copies of the
//! touched state and committed only when the ledger operation and its value
//! transfers all succeed, so a rejected call leaves the chain untouched.

use super::{Ledger, LedgerError, Payout};
use crate::driver::{Deployer, LedgerHandle, TxOutcome};
use crate::{Error, Result};
use alloy::primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct ChainState {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    ledgers: HashMap<Address, Ledger>,
    block_number: u64,
}

impl ChainState {
    /// Consume a nonce for `sender` and mine a block for it
    fn next_transaction(&mut self, sender: Address) -> (u64, B256) {
        let nonce = self.nonces.entry(sender).or_insert(0);
        let used = *nonce;
        *nonce += 1;
        self.block_number += 1;

        let mut preimage = sender.to_vec();
        preimage.extend_from_slice(&used.to_be_bytes());
        (used, keccak256(preimage))
    }
}

/// Move native value between staged balances
fn move_value(
    balances: &mut HashMap<Address, U256>,
    from: Address,
    to: Address,
    amount: U256,
) -> Result<()> {
    if amount.is_zero() {
        return Ok(());
    }
    let available = balances.get(&from).copied().unwrap_or(U256::ZERO);
    if available < amount {
        return Err(Error::Reverted(format!(
            "transfer of {} from {} exceeds its balance {}",
            amount, from, available
        )));
    }
    let held = balances.get(&to).copied().unwrap_or(U256::ZERO);
    let credited = held.checked_add(amount).ok_or_else(|| {
        Error::Reverted(format!(
            "transfer of {} to {} overflows its balance {}",
            amount, to, held
        ))
    })?;
    balances.insert(from, available - amount);
    balances.insert(to, credited);
    Ok(())
}

/// Shared handle to one simulated chain
#[derive(Debug, Clone, Default)]
pub struct SimulatedChain {
    state: Arc<RwLock<ChainState>>,
}

impl SimulatedChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of native value to `account`
    pub async fn fund(&self, account: Address, amount: U256) {
        let mut state = self.state.write().await;
        let balance = state.balances.entry(account).or_insert(U256::ZERO);
        *balance = balance.saturating_add(amount);
    }

    /// Native value held by `account`
    pub async fn native_balance(&self, account: Address) -> U256 {
        self.state
            .read()
            .await
            .balances
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub async fn block_number(&self) -> u64 {
        self.state.read().await.block_number
    }

    /// Snapshot of the ledger deployed at `address`
    pub async fn ledger(&self, address: Address) -> Option<Ledger> {
        self.state.read().await.ledgers.get(&address).cloned()
    }

    /// Deploy a ledger owned by `deployer`, funded with `init_balance`
    ///
    /// The initial balance is sent along with the deployment, so `deployer`
    /// must hold it. A deployer that cannot pay leaves the chain untouched.
    pub async fn deploy(&self, deployer: Address, init_balance: U256) -> Result<SimulatedLedger> {
        let mut state = self.state.write().await;
        let nonce = state.nonces.get(&deployer).copied().unwrap_or(0);
        let address = deployer.create(nonce);

        let mut balances = state.balances.clone();
        move_value(&mut balances, deployer, address, init_balance)?;
        state.balances = balances;

        let (_, hash) = state.next_transaction(deployer);
        state
            .ledgers
            .insert(address, Ledger::new(deployer, init_balance));

        tracing::debug!(%address, %deployer, tx = %hash, "Simulated ledger deployment");
        Ok(SimulatedLedger {
            chain: self.clone(),
            address,
            caller: deployer,
        })
    }

    /// Handle to the ledger at `address` acting as `caller`
    pub fn at(&self, address: Address, caller: Address) -> SimulatedLedger {
        SimulatedLedger {
            chain: self.clone(),
            address,
            caller,
        }
    }
}

/// A ledger on the simulated chain bound to one caller
#[derive(Debug, Clone)]
pub struct SimulatedLedger {
    chain: SimulatedChain,
    address: Address,
    caller: Address,
}

impl SimulatedLedger {
    /// Same ledger, different caller
    pub fn connect(&self, caller: Address) -> Self {
        Self {
            caller,
            ..self.clone()
        }
    }

    async fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T> {
        let state = self.chain.state.read().await;
        state
            .ledgers
            .get(&self.address)
            .map(f)
            .ok_or_else(|| self.missing())
    }

    /// Apply one state-changing call with `value` attached
    async fn execute<F>(&self, value: U256, op: F) -> Result<TxOutcome>
    where
        F: FnOnce(&mut Ledger, Address) -> std::result::Result<Option<Payout>, LedgerError>
            + Send,
    {
        let mut state = self.chain.state.write().await;
        let mut ledger = state
            .ledgers
            .get(&self.address)
            .cloned()
            .ok_or_else(|| self.missing())?;
        let mut balances = state.balances.clone();
        let emitted_before = ledger.events().len();

        move_value(&mut balances, self.caller, self.address, value)?;
        if let Some(payout) = op(&mut ledger, self.caller)? {
            move_value(&mut balances, self.address, payout.to, payout.amount)?;
        }

        let events = ledger.events()[emitted_before..].to_vec();
        state.balances = balances;
        state.ledgers.insert(self.address, ledger);
        let (_, hash) = state.next_transaction(self.caller);

        Ok(TxOutcome {
            hash,
            block_number: Some(state.block_number),
            gas_used: None,
            events,
        })
    }

    fn missing(&self) -> Error {
        Error::InvalidArgument(format!("no ledger deployed at {}", self.address))
    }
}

#[async_trait]
impl LedgerHandle for SimulatedLedger {
    fn address(&self) -> Address {
        self.address
    }

    fn caller(&self) -> Address {
        self.caller
    }

    async fn get_balance(&self) -> Result<U256> {
        self.read(Ledger::balance).await
    }

    async fn owner(&self) -> Result<Address> {
        self.read(Ledger::owner).await
    }

    async fn deposit(&self, amount: U256) -> Result<TxOutcome> {
        self.execute(amount, |ledger, caller| {
            ledger.deposit(caller, amount).map(|_| None)
        })
        .await
    }

    async fn withdraw(&self, amount: U256) -> Result<TxOutcome> {
        self.execute(U256::ZERO, |ledger, caller| {
            ledger.withdraw(caller, amount).map(Some)
        })
        .await
    }

    async fn withdraw_all(&self) -> Result<TxOutcome> {
        self.execute(U256::ZERO, |ledger, caller| {
            ledger.withdraw_all(caller).map(Some)
        })
        .await
    }

    async fn renounce_ownership(&self) -> Result<TxOutcome> {
        self.execute(U256::ZERO, |ledger, caller| {
            ledger.renounce_ownership(caller).map(|_| None)
        })
        .await
    }
}

/// Deployer backed by a simulated chain and a fixed account list
#[derive(Debug, Clone)]
pub struct SimulatedDeployer {
    chain: SimulatedChain,
    accounts: Vec<Address>,
}

impl SimulatedDeployer {
    pub fn new(chain: SimulatedChain, accounts: Vec<Address>) -> Self {
        Self { chain, accounts }
    }

    pub fn chain(&self) -> &SimulatedChain {
        &self.chain
    }
}

#[async_trait]
impl Deployer for SimulatedDeployer {
    type Handle = SimulatedLedger;

    async fn request_access(&self) -> Result<Address> {
        self.accounts
            .first()
            .copied()
            .ok_or_else(|| Error::Wallet("Simulated chain exposes no accounts".to_string()))
    }

    async fn deploy(&self, account: Address, init_balance: U256) -> Result<SimulatedLedger> {
        self.chain.deploy(account, init_balance).await
    }

    fn attach(&self, account: Address, contract: Address) -> SimulatedLedger {
        self.chain.at(contract, account)
    }
}
