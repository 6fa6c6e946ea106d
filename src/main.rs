//! Ledger Deployer CLI
//!
//! Command-line interface for deploying and exercising the Ledger contract.

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use ledger_deployer::contract::Artifact;
use ledger_deployer::driver::OnChainDeployer;
use ledger_deployer::ledger::{SimulatedChain, SimulatedDeployer};
use ledger_deployer::wallet::{SecureWallet, PRIVATE_KEY_ENV};
use ledger_deployer::{
    run_script, AuditLog, Config, Deployer, EtherAmount, LedgerHandle, Result, RpcConfig,
    ScriptPlan,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ledger-deployer")]
#[command(about = "Deploy the Ledger contract and run a deposit/withdraw script against it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

/// Amount overrides; unset values come from the config
#[derive(Args, Debug, Default)]
struct PlanArgs {
    /// Constructor balance, in ether (e.g. 100)
    #[arg(long, value_parser = parse_amount)]
    init_balance: Option<EtherAmount>,

    /// Value to deposit, in ether (e.g. 1.0)
    #[arg(long, value_parser = parse_amount)]
    deposit: Option<EtherAmount>,

    /// Amount to withdraw, in ether (e.g. 0.5)
    #[arg(long, value_parser = parse_amount)]
    withdraw: Option<EtherAmount>,
}

impl PlanArgs {
    fn apply(&self, base: ScriptPlan) -> ScriptPlan {
        ScriptPlan {
            init_balance: self.init_balance.unwrap_or(base.init_balance),
            deposit: self.deposit.unwrap_or(base.deposit),
            withdraw: self.withdraw.unwrap_or(base.withdraw),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the contract on a live node and run the script
    Run {
        #[command(flatten)]
        plan: PlanArgs,

        /// Compiled Ledger artifact (forge/hardhat JSON or raw hex)
        #[arg(long)]
        artifact: Option<PathBuf>,

        /// Confirmations to wait for on each transaction
        #[arg(long)]
        confirmations: Option<u64>,
    },

    /// Run the script on an in-process simulated chain
    Simulate {
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Call one Ledger operation on an already deployed contract
    Call {
        /// Deployed Ledger address
        #[arg(long, value_parser = parse_address)]
        contract: Address,

        #[command(subcommand)]
        action: CallAction,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum CallAction {
    /// Read the shared balance
    Balance,
    /// Read the current owner
    Owner,
    /// Deposit attached value
    Deposit {
        #[arg(value_parser = parse_amount)]
        amount: EtherAmount,
    },
    /// Withdraw part of the balance
    Withdraw {
        #[arg(value_parser = parse_amount)]
        amount: EtherAmount,
    },
    /// Withdraw the whole balance
    WithdrawAll,
    /// Give up ownership for good
    Renounce,
}

fn parse_amount(s: &str) -> std::result::Result<EtherAmount, String> {
    EtherAmount::parse(s).map_err(|e| e.to_string())
}

fn parse_address(s: &str) -> std::result::Result<Address, String> {
    s.parse().map_err(|e| format!("Invalid address {}: {}", s, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    // Load config
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let result = match cli.command {
        Commands::Run {
            plan,
            artifact,
            confirmations,
        } => run_onchain(config, plan, artifact, confirmations).await,
        Commands::Simulate { plan } => run_simulated(config, plan).await,
        Commands::Call { contract, action } => run_call(contract, action).await,
        Commands::Config => print_json(&config),
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Aborted");
    }
    result
}

async fn run_onchain(
    config: Config,
    plan: PlanArgs,
    artifact: Option<PathBuf>,
    confirmations: Option<u64>,
) -> Result<()> {
    let plan = plan.apply(config.script);
    let artifact_path = artifact.unwrap_or(config.artifact_path);
    let confirmations = confirmations.unwrap_or(config.confirmations);

    let rpc = RpcConfig::from_env();
    let wallet = load_wallet()?;
    let artifact = Artifact::load(&artifact_path)?;

    let deployer = OnChainDeployer::connect(&rpc, wallet.as_ref())?
        .with_artifact(artifact)
        .with_confirmations(confirmations);

    let chain_id = deployer.chain_id().await?;
    tracing::info!(
        rpc = %rpc.redacted(),
        source = ?rpc.source(),
        chain_id,
        confirmations,
        "Connected to node"
    );

    let audit = config.audit_log_path.as_ref().map(|p| AuditLog::new(p));
    if let Some(log) = &audit {
        let path = log.path().await;
        tracing::info!(run_id = %log.run_id(), path = %path.display(), "Audit log enabled");
    }

    let report = run_script(&deployer, &plan, audit.as_ref()).await?;

    let remaining = deployer.native_balance(report.account).await?;
    tracing::info!(
        account = %report.account,
        balance = %EtherAmount::from_wei(remaining),
        "Account balance after script"
    );

    print_json(&report)
}

async fn run_simulated(config: Config, plan: PlanArgs) -> Result<()> {
    let plan = plan.apply(config.script);
    let account = config.simulation.account;

    let chain = SimulatedChain::new();
    chain
        .fund(account, config.simulation.funded_balance.wei())
        .await;
    let deployer = SimulatedDeployer::new(chain.clone(), vec![account]);

    tracing::info!(
        %account,
        funded = %config.simulation.funded_balance,
        "Running on simulated chain"
    );

    let audit = config.audit_log_path.as_ref().map(|p| AuditLog::new(p));
    let report = run_script(&deployer, &plan, audit.as_ref()).await?;

    let balance = chain.native_balance(account).await;
    let holdings = chain.native_balance(report.contract).await;
    let block = chain.block_number().await;
    tracing::info!(
        account = %account,
        balance = %EtherAmount::from_wei(balance),
        contract_holdings = %EtherAmount::from_wei(holdings),
        block,
        "Simulated chain state after script"
    );

    print_json(&report)
}

async fn run_call(contract: Address, action: CallAction) -> Result<()> {
    let rpc = RpcConfig::from_env();
    let wallet = load_wallet()?;
    let deployer = OnChainDeployer::connect(&rpc, wallet.as_ref())?;

    let account = deployer.request_access().await?;
    let ledger = deployer.attach(account, contract);

    tracing::info!(%contract, caller = %account, "Calling ledger");

    match action {
        CallAction::Balance => {
            let balance = ledger.get_balance().await?;
            println!("{} ({} wei)", EtherAmount::from_wei(balance), balance);
            Ok(())
        }
        CallAction::Owner => {
            let owner = ledger.owner().await?;
            if owner.is_zero() {
                println!("{} (renounced)", owner);
            } else {
                println!("{}", owner);
            }
            Ok(())
        }
        CallAction::Deposit { amount } => print_json(&ledger.deposit(amount.wei()).await?),
        CallAction::Withdraw { amount } => print_json(&ledger.withdraw(amount.wei()).await?),
        CallAction::WithdrawAll => print_json(&ledger.withdraw_all().await?),
        CallAction::Renounce => print_json(&ledger.renounce_ownership().await?),
    }
}

fn load_wallet() -> Result<Option<SecureWallet>> {
    let wallet = SecureWallet::from_env(PRIVATE_KEY_ENV)?;
    match &wallet {
        Some(w) => tracing::info!(address = %w.address(), "Loaded wallet from PRIVATE_KEY"),
        None => tracing::info!("No PRIVATE_KEY set - requesting accounts from the node"),
    }
    Ok(wallet)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
