//! Ledger contract bindings
//!
//! The Solidity source lives in `contracts/Ledger.sol` and is compiled by
//! the user's toolchain (forge, hardhat or solc). This module only carries
//! the ABI, loads the compiled bytecode and decodes reverts.

mod artifact;
mod revert;

pub use artifact::{Artifact, DEFAULT_ARTIFACT_PATH};
pub use revert::{classify_call_error, decode_revert_data, parse_revert_reason};

use alloy::primitives::{Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolConstructor;

sol! {
    #[sol(rpc, all_derives)]
    contract Ledger {
        event Deposit(address indexed account, uint256 amount);
        event Withdraw(address indexed account, uint256 amount);

        error InsufficientFunds(uint256 balance, uint256 amount);
        error NothingToWithdraw();
        error NotOwner(address caller);

        constructor(uint256 initBalance) payable;

        function owner() external view returns (address);
        function getBalance() external view returns (uint256);
        function deposit() external payable;
        function withdraw(uint256 amount) external;
        function withdrawAll() external;
        function renounceOwnership() external;
    }
}

/// Creation code followed by the ABI-encoded constructor argument
pub fn deploy_code(bytecode: &Bytes, init_balance: U256) -> Bytes {
    let args = Ledger::constructorCall {
        initBalance: init_balance,
    }
    .abi_encode();

    let mut code = Vec::with_capacity(bytecode.len() + args.len());
    code.extend_from_slice(bytecode);
    code.extend_from_slice(&args);
    code.into()
}
