//! Account access through the node
//!
//! Mirrors the browser-wallet handshake: ask the provider for accounts with
//! `eth_requestAccounts`. Plain dev nodes often only know `eth_accounts`, so
//! that is tried when the first request is refused.

use crate::{Error, Result};
use alloy::primitives::Address;
use alloy::providers::Provider;

/// JSON-RPC method asking the provider to expose its accounts
pub const REQUEST_ACCOUNTS_METHOD: &str = "eth_requestAccounts";

/// EIP-1193 "user rejected the request"
const USER_REJECTED_CODE: i64 = 4001;

/// Ask `provider` for the accounts it can sign for
pub async fn request_accounts<P: Provider>(provider: &P) -> Result<Vec<Address>> {
    match provider
        .raw_request::<_, Vec<Address>>(REQUEST_ACCOUNTS_METHOD.into(), ())
        .await
    {
        Ok(accounts) => Ok(accounts),
        Err(e) if e.as_error_resp().map(|p| p.code) == Some(USER_REJECTED_CODE) => Err(
            Error::Wallet(format!("Account access denied: {}", e)),
        ),
        Err(e) => {
            tracing::debug!(
                error = %e,
                "{} refused, falling back to eth_accounts",
                REQUEST_ACCOUNTS_METHOD
            );
            Ok(provider.get_accounts().await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use alloy::providers::{mock::Asserter, ProviderBuilder};
    use alloy::rpc::json_rpc::ErrorPayload;

    const DEV: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const SECOND: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");

    #[tokio::test]
    async fn test_granted_accounts_are_returned() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        asserter.push_success(&vec![DEV, SECOND]);

        let accounts = request_accounts(&provider).await.unwrap();
        assert_eq!(accounts, vec![DEV, SECOND]);
    }

    #[tokio::test]
    async fn test_unsupported_method_falls_back_to_eth_accounts() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        asserter.push_failure_msg("method not found");
        asserter.push_success(&vec![SECOND]);

        let accounts = request_accounts(&provider).await.unwrap();
        assert_eq!(accounts, vec![SECOND]);
    }

    #[tokio::test]
    async fn test_user_rejection_aborts() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        asserter.push_failure(ErrorPayload {
            code: USER_REJECTED_CODE,
            message: "User rejected the request.".into(),
            data: None,
        });
        // Must not be consumed by a fallback
        asserter.push_success(&vec![DEV]);

        let err = request_accounts(&provider).await.unwrap_err();
        assert!(matches!(err, Error::Wallet(_)));
        assert!(err.to_string().contains("denied"));
    }
}
