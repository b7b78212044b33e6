//! EIP-1193 provider port and error classification

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::keys::codes;
use crate::error::WalletError;

/// Error object returned by an EIP-1193 `request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code:?})")]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }

    pub fn uncoded(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn user_rejected() -> Self {
        Self::new(codes::USER_REJECTED, "User rejected the request.")
    }

    /// `wallet_switchEthereumChain` on a chain the wallet does not know.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(codes::UNRECOGNIZED_CHAIN)
    }

    pub fn is_user_rejection(&self) -> bool {
        if self.code == Some(codes::USER_REJECTED) {
            return true;
        }
        // Some wallets reject without a code
        let message = self.message.to_ascii_lowercase();
        self.code.is_none()
            && ["rejected", "denied", "refused"].iter().any(|w| message.contains(w))
    }
}

impl From<ProviderError> for WalletError {
    fn from(e: ProviderError) -> Self {
        if e.is_user_rejection() {
            return WalletError::UserRejected;
        }
        match e.code {
            Some(codes::REQUEST_PENDING) => WalletError::ProviderBusy,
            Some(codes::INTERNAL_ERROR) => WalletError::ProviderInternal,
            code => WalletError::Provider { code, message: e.message },
        }
    }
}

/// An injected EVM wallet (`window.ethereum` or an EIP-6963 announcement).
#[async_trait(?Send)]
pub trait EvmProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}
