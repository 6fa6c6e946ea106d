//! Deploy-and-interact script driver
//!
//! The script never reaches for an ambient provider. It receives a
//! [`Deployer`] that knows how to obtain account access and deploy, and the
//! [`LedgerHandle`] that deployment hands back. Two implementations exist:
//! - [`OnChainDeployer`] talks to an RPC node through alloy
//! - [`crate::ledger::SimulatedDeployer`] runs against an in-process chain

mod onchain;

pub use onchain::{OnChainDeployer, OnChainLedger};

use crate::audit::AuditLog;
use crate::ledger::LedgerEvent;
use crate::units::EtherAmount;
use crate::Result;
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Instant;
use tracing::{error, info};

/// Result of a mined state-changing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    pub hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    /// Ledger events emitted by the transaction, in log order
    pub events: Vec<LedgerEvent>,
}

/// A deployed Ledger instance bound to one caller account
#[async_trait]
pub trait LedgerHandle: Send + Sync {
    /// Contract address
    fn address(&self) -> Address;

    /// Account the handle signs calls as
    fn caller(&self) -> Address;

    async fn get_balance(&self) -> Result<U256>;

    async fn owner(&self) -> Result<Address>;

    /// Deposit `amount` of attached value
    async fn deposit(&self, amount: U256) -> Result<TxOutcome>;

    async fn withdraw(&self, amount: U256) -> Result<TxOutcome>;

    async fn withdraw_all(&self) -> Result<TxOutcome>;

    async fn renounce_ownership(&self) -> Result<TxOutcome>;
}

/// Something able to grant account access and deploy a Ledger
#[async_trait]
pub trait Deployer: Send + Sync {
    type Handle: LedgerHandle;

    /// Request account access and return the account to act as
    async fn request_access(&self) -> Result<Address>;

    /// Deploy a new Ledger from `account` holding `init_balance`
    async fn deploy(&self, account: Address, init_balance: U256) -> Result<Self::Handle>;

    /// Bind to an already deployed Ledger
    fn attach(&self, account: Address, contract: Address) -> Self::Handle;
}

/// Amounts the script uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPlan {
    /// Constructor argument
    pub init_balance: EtherAmount,
    /// Value attached to the deposit call
    pub deposit: EtherAmount,
    /// Amount requested by the withdraw call
    pub withdraw: EtherAmount,
}

impl Default for ScriptPlan {
    /// Deposit 1.0 then withdraw 0.5 from a ledger created empty
    fn default() -> Self {
        Self {
            init_balance: EtherAmount::ZERO,
            deposit: EtherAmount::from_milliether(1_000),
            withdraw: EtherAmount::from_milliether(500),
        }
    }
}

/// Everything the script observed
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub account: Address,
    pub contract: Address,
    pub initial_balance: U256,
    pub deposit: TxOutcome,
    pub withdraw: TxOutcome,
    pub final_balance: U256,
}

/// Run the deploy, read, deposit, withdraw sequence
///
/// Steps run strictly one after another. The first failure aborts the rest
/// of the sequence and is returned to the caller.
pub async fn run_script<D: Deployer>(
    deployer: &D,
    plan: &ScriptPlan,
    audit: Option<&AuditLog>,
) -> Result<ScriptReport> {
    info!(
        init_balance = %plan.init_balance,
        deposit = %plan.deposit,
        withdraw = %plan.withdraw,
        "Starting ledger script"
    );

    let account = step(audit, "request_access", json!({}), deployer.request_access()).await?;
    info!(account = %account, "Account access granted");

    let ledger = step_with(
        audit,
        "deploy",
        json!({ "account": account, "init_balance": plan.init_balance }),
        deployer.deploy(account, plan.init_balance.wei()),
        |ledger: &D::Handle| json!({ "address": ledger.address() }),
    )
    .await?;
    info!(address = %ledger.address(), "Deployed contract address");

    let initial_balance = step(
        audit,
        "get_balance",
        json!({ "contract": ledger.address() }),
        ledger.get_balance(),
    )
    .await?;
    info!(
        balance = %EtherAmount::from_wei(initial_balance),
        wei = %initial_balance,
        "Current balance"
    );

    let deposit = step(
        audit,
        "deposit",
        json!({ "amount": plan.deposit }),
        ledger.deposit(plan.deposit.wei()),
    )
    .await?;
    info!(tx = %deposit.hash, amount = %plan.deposit, "Deposit confirmed");

    let withdraw = step(
        audit,
        "withdraw",
        json!({ "amount": plan.withdraw }),
        ledger.withdraw(plan.withdraw.wei()),
    )
    .await?;
    info!(tx = %withdraw.hash, amount = %plan.withdraw, "Withdrawal confirmed");

    let final_balance = step(
        audit,
        "get_balance",
        json!({ "contract": ledger.address() }),
        ledger.get_balance(),
    )
    .await?;
    info!(
        balance = %EtherAmount::from_wei(final_balance),
        wei = %final_balance,
        "Final balance"
    );

    Ok(ScriptReport {
        account,
        contract: ledger.address(),
        initial_balance,
        deposit,
        withdraw,
        final_balance,
    })
}

/// Await one script step, recording its serialized result in the audit log
async fn step<T, F>(audit: Option<&AuditLog>, name: &str, detail: Value, fut: F) -> Result<T>
where
    T: Serialize,
    F: Future<Output = Result<T>>,
{
    step_with(audit, name, detail, fut, |v| {
        serde_json::to_value(v).unwrap_or(Value::Null)
    })
    .await
}

/// Await one script step, recording `record(&value)` in the audit log
async fn step_with<T, F, R>(
    audit: Option<&AuditLog>,
    name: &str,
    detail: Value,
    fut: F,
    record: R,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
    R: FnOnce(&T) -> Value,
{
    if let Some(log) = audit {
        log.step_started(name, &detail).await;
    }

    let started = Instant::now();
    let result = fut.await;
    let duration_ms = started.elapsed().as_millis() as u64;

    if let Err(e) = &result {
        error!(step = name, error = %e, "Script step failed");
    }

    if let Some(log) = audit {
        let outcome = match &result {
            Ok(v) => Ok(record(v)),
            Err(e) => Err(e.to_string()),
        };
        log.step_finished(name, &detail, outcome, duration_ms).await;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::read_entries;
    use crate::ledger::{LedgerError, LedgerEventKind, SimulatedChain, SimulatedDeployer};
    use crate::Error;
    use alloy::primitives::address;

    const DEV: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

    fn ether(s: &str) -> EtherAmount {
        EtherAmount::parse(s).unwrap()
    }

    async fn funded_deployer() -> (SimulatedChain, SimulatedDeployer) {
        let chain = SimulatedChain::new();
        chain.fund(DEV, ether("100").wei()).await;
        let deployer = SimulatedDeployer::new(chain.clone(), vec![DEV]);
        (chain, deployer)
    }

    #[tokio::test]
    async fn test_script_deposits_then_withdraws() {
        let (chain, deployer) = funded_deployer().await;
        let plan = ScriptPlan {
            init_balance: EtherAmount::ZERO,
            deposit: ether("1.0"),
            withdraw: ether("0.5"),
        };

        let report = run_script(&deployer, &plan, None).await.unwrap();

        assert_eq!(report.account, DEV);
        assert_eq!(report.initial_balance, U256::ZERO);
        assert_eq!(report.final_balance, ether("0.5").wei());
        assert_eq!(report.deposit.events[0].kind, LedgerEventKind::Deposit);
        assert_eq!(report.withdraw.events[0].kind, LedgerEventKind::Withdraw);

        // 1.0 went in, 0.5 came back
        assert_eq!(chain.native_balance(DEV).await, ether("99.5").wei());
        assert_eq!(
            chain.native_balance(report.contract).await,
            ether("0.5").wei()
        );
    }

    #[tokio::test]
    async fn test_script_aborts_on_rejected_withdrawal() {
        let (_chain, deployer) = funded_deployer().await;
        let dir = tempfile::tempdir().unwrap();
        let audit_path = dir.path().join("audit.jsonl");
        let audit = AuditLog::new(&audit_path);

        let plan = ScriptPlan {
            init_balance: EtherAmount::ZERO,
            deposit: ether("1.0"),
            withdraw: ether("2.0"),
        };

        let err = run_script(&deployer, &plan, Some(&audit))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::InsufficientFunds { .. })
        ));

        let entries = read_entries(&audit_path).unwrap();
        let last = entries.last().unwrap();
        assert_eq!(last["step"], "withdraw");
        assert_eq!(last["status"], "error");

        // The final balance read never ran
        let balance_reads = entries
            .iter()
            .filter(|e| e["step"] == "get_balance" && e["entry_type"] == "step_start")
            .count();
        assert_eq!(balance_reads, 1);
    }

    #[tokio::test]
    async fn test_audit_records_deployed_address() {
        let (_chain, deployer) = funded_deployer().await;
        let dir = tempfile::tempdir().unwrap();
        let audit_path = dir.path().join("audit.jsonl");
        let audit = AuditLog::new(&audit_path);

        let report = run_script(&deployer, &ScriptPlan::default(), Some(&audit))
            .await
            .unwrap();

        let entries = read_entries(&audit_path).unwrap();
        let deploy = entries
            .iter()
            .find(|e| e["step"] == "deploy" && e["entry_type"] == "step_complete")
            .unwrap();
        assert_eq!(deploy["status"], "success");
        assert_eq!(
            deploy["result"]["address"],
            serde_json::to_value(report.contract).unwrap()
        );
    }

    #[tokio::test]
    async fn test_init_balance_is_withdrawable() {
        let (chain, deployer) = funded_deployer().await;
        let plan = ScriptPlan {
            init_balance: ether("10"),
            deposit: ether("5"),
            withdraw: ether("12"),
        };

        let report = run_script(&deployer, &plan, None).await.unwrap();

        assert_eq!(report.initial_balance, ether("10").wei());
        assert_eq!(report.final_balance, ether("3").wei());
        assert_eq!(chain.native_balance(DEV).await, ether("97").wei());
    }

    #[tokio::test]
    async fn test_script_fails_without_accounts() {
        let deployer = SimulatedDeployer::new(SimulatedChain::new(), Vec::new());
        let plan = ScriptPlan {
            init_balance: EtherAmount::ZERO,
            deposit: ether("1.0"),
            withdraw: ether("0.5"),
        };

        let err = run_script(&deployer, &plan, None).await.unwrap_err();
        assert!(matches!(err, Error::Wallet(_)));
    }
}
