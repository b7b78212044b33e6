//! Wallet error taxonomy
//!
//! Every failure that can reach a caller is one of these variants. Public
//! actions write the `Display` text into `lastError` and hand the value back;
//! nothing here is ever raised into rendering code.

use std::time::Duration;

use crate::session::WalletKind;

pub type WalletResult<T> = Result<T, WalletError>;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("{0} is not installed. Install the {0} browser extension and reload the page")]
    NotDetected(String),

    #[error("Request was rejected in the wallet")]
    UserRejected,

    #[error("The wallet is already processing a request. Open the extension to finish it")]
    ProviderBusy,

    #[error("The wallet reported an internal error. Try restarting the extension")]
    ProviderInternal,

    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout { operation: String, after: Duration },

    #[error("No accounts returned. Unlock your wallet and try again")]
    NoAccounts,

    #[error("The wallet did not return an address")]
    NoAddress,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("{0} is not connected")]
    NotConnected(WalletKind),

    #[error("Connection attempt was superseded")]
    Superseded,

    #[error("Wallet error: {message}")]
    Provider { code: Option<i64>, message: String },

    #[error("Unexpected wallet response: {0}")]
    MalformedResponse(String),

    #[error("Balance lookup failed: {0}")]
    BalanceLookup(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalletError {
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        WalletError::Timeout { operation: operation.into(), after }
    }

    /// True for failures the user caused by declining a prompt.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::UserRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = WalletError::NotDetected("MetaMask".into());
        assert!(err.to_string().starts_with("MetaMask is not installed"));

        let err = WalletError::timeout("eth_requestAccounts", Duration::from_secs(15));
        assert_eq!(err.to_string(), "eth_requestAccounts timed out after 15s");

        let err = WalletError::NotConnected(WalletKind::Gem);
        assert_eq!(err.to_string(), "GemWallet is not connected");
    }

    #[test]
    fn invalid_address_mentions_address() {
        let err = WalletError::InvalidAddress("destination must start with 'r'".into());
        assert!(err.to_string().to_lowercase().contains("invalid address"));
    }
}
