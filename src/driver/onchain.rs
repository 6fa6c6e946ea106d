//! On-chain Ledger driver
//!
//! Deploys and calls the Solidity Ledger through an alloy provider. Every
//! state-changing contract call is first run through `eth_call` so a revert
//! is caught and decoded before anything is signed, then submitted and
//! awaited to the configured number of confirmations. Deployments carry the
//! initial balance as value so the contract can pay it out.

use super::{Deployer, LedgerHandle, TxOutcome};
use crate::config::RpcConfig;
use crate::contract::{classify_call_error, deploy_code, Artifact, Ledger};
use crate::ledger::LedgerEvent;
use crate::wallet::{request_accounts, SecureWallet};
use crate::{Error, Result};
use alloy::contract::SolCallBuilder;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Log, TransactionReceipt, TransactionRequest};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tracing::{debug, info};

/// Deployer speaking JSON-RPC to a node
pub struct OnChainDeployer {
    provider: DynProvider,
    bytecode: Option<Bytes>,
    local_account: Option<Address>,
    confirmations: u64,
}

impl OnChainDeployer {
    /// Build a provider for `rpc`, signing locally when a wallet is given
    ///
    /// Without a wallet, transactions go out as `eth_sendTransaction` and the
    /// node signs with one of its own accounts.
    pub fn connect(rpc: &RpcConfig, wallet: Option<&SecureWallet>) -> Result<Self> {
        let url = rpc.parsed_url()?;
        let provider = match wallet {
            Some(w) => ProviderBuilder::new()
                .wallet(w.wallet().clone())
                .connect_http(url)
                .erased(),
            None => ProviderBuilder::new().connect_http(url).erased(),
        };

        debug!(
            rpc = %rpc.redacted(),
            local_signer = wallet.is_some(),
            "Connected provider"
        );

        Ok(Self {
            provider,
            bytecode: None,
            local_account: wallet.map(SecureWallet::address),
            confirmations: 1,
        })
    }

    /// Use `artifact` as the creation code for deployments
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.bytecode = Some(artifact.bytecode);
        self
    }

    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    /// Native balance of `account`
    pub async fn native_balance(&self, account: Address) -> Result<U256> {
        Ok(self.provider.get_balance(account).await?)
    }
}

#[async_trait]
impl Deployer for OnChainDeployer {
    type Handle = OnChainLedger;

    async fn request_access(&self) -> Result<Address> {
        if let Some(account) = self.local_account {
            debug!(%account, "Using local signer account");
            return Ok(account);
        }

        let accounts = request_accounts(&self.provider).await?;
        accounts.first().copied().ok_or_else(|| {
            Error::Wallet(
                "Provider exposes no accounts. Set PRIVATE_KEY to sign locally.".to_string(),
            )
        })
    }

    async fn deploy(&self, account: Address, init_balance: U256) -> Result<OnChainLedger> {
        let bytecode = self.bytecode.as_ref().ok_or_else(|| {
            Error::Artifact("No contract bytecode loaded for deployment".to_string())
        })?;

        let tx = TransactionRequest::default()
            .from(account)
            .with_deploy_code(deploy_code(bytecode, init_balance))
            .with_value(init_balance);

        let pending = self.provider.send_transaction(tx).await?;
        info!(tx = %pending.tx_hash(), "Deployment submitted");

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await?;
        ensure_success(&receipt)?;

        let address = receipt.contract_address.ok_or_else(|| {
            Error::Reverted(format!(
                "deployment {} produced no contract address",
                receipt.transaction_hash
            ))
        })?;

        Ok(self.attach(account, address))
    }

    fn attach(&self, account: Address, contract: Address) -> OnChainLedger {
        OnChainLedger {
            contract: Ledger::new(contract, self.provider.clone()),
            caller: account,
            confirmations: self.confirmations,
        }
    }
}

/// Deployed Ledger contract bound to one caller
#[derive(Debug, Clone)]
pub struct OnChainLedger {
    contract: Ledger::LedgerInstance<DynProvider>,
    caller: Address,
    confirmations: u64,
}

impl OnChainLedger {
    /// Preflight with `eth_call`, then sign, submit and await the receipt
    async fn submit<C>(&self, action: &str, call: SolCallBuilder<&DynProvider, C>) -> Result<TxOutcome>
    where
        C: SolCall + Send + Sync,
    {
        call.call().await.map_err(classify_call_error)?;

        let pending = call.send().await.map_err(classify_call_error)?;
        debug!(action, tx = %pending.tx_hash(), "Transaction submitted");

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await?;
        ensure_success(&receipt)?;

        Ok(outcome_from_receipt(&receipt, *self.contract.address()))
    }
}

#[async_trait]
impl LedgerHandle for OnChainLedger {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    fn caller(&self) -> Address {
        self.caller
    }

    async fn get_balance(&self) -> Result<U256> {
        self.contract
            .getBalance()
            .from(self.caller)
            .call()
            .await
            .map_err(classify_call_error)
    }

    async fn owner(&self) -> Result<Address> {
        self.contract
            .owner()
            .call()
            .await
            .map_err(classify_call_error)
    }

    async fn deposit(&self, amount: U256) -> Result<TxOutcome> {
        let call = self.contract.deposit().from(self.caller).value(amount);
        self.submit("deposit", call).await
    }

    async fn withdraw(&self, amount: U256) -> Result<TxOutcome> {
        let call = self.contract.withdraw(amount).from(self.caller);
        self.submit("withdraw", call).await
    }

    async fn withdraw_all(&self) -> Result<TxOutcome> {
        let call = self.contract.withdrawAll().from(self.caller);
        self.submit("withdraw_all", call).await
    }

    async fn renounce_ownership(&self) -> Result<TxOutcome> {
        let call = self.contract.renounceOwnership().from(self.caller);
        self.submit("renounce_ownership", call).await
    }
}

fn ensure_success(receipt: &TransactionReceipt) -> Result<()> {
    if receipt.status() {
        Ok(())
    } else {
        Err(Error::Reverted(format!(
            "transaction {} reverted in block {:?}",
            receipt.transaction_hash, receipt.block_number
        )))
    }
}

fn outcome_from_receipt(receipt: &TransactionReceipt, contract: Address) -> TxOutcome {
    let events = receipt
        .inner
        .logs()
        .iter()
        .filter_map(|log| decode_event(log, contract))
        .collect();

    TxOutcome {
        hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: Some(receipt.gas_used),
        events,
    }
}

/// Decode a Deposit or Withdraw log emitted by `contract`
fn decode_event(log: &Log, contract: Address) -> Option<LedgerEvent> {
    if log.inner.address != contract {
        return None;
    }
    if let Ok(decoded) = log.log_decode::<Ledger::Deposit>() {
        let event = decoded.inner.data;
        return Some(LedgerEvent::deposit(event.account, event.amount));
    }
    if let Ok(decoded) = log.log_decode::<Ledger::Withdraw>() {
        let event = decoded.inner.data;
        return Some(LedgerEvent::withdraw(event.account, event.amount));
    }
    None
}
