//! Balance fallback endpoint
//!
//! `GET <endpoint>?address=<addr>` answers `{success, balance?, error?}`. The
//! same wire type is served by [`crate::server`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BalanceResponse {
    pub fn ok(balance: impl Into<String>) -> Self {
        Self { success: true, balance: Some(balance.into()), error: None }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self { success: false, balance: None, error: Some(error.into()) }
    }

    pub fn into_result(self) -> WalletResult<String> {
        match (self.success, self.balance) {
            (true, Some(balance)) => Ok(balance),
            (true, None) => Err(WalletError::BalanceLookup("response carried no balance".into())),
            (false, _) => Err(WalletError::BalanceLookup(
                self.error.unwrap_or_else(|| "unknown error".into()),
            )),
        }
    }
}

#[async_trait(?Send)]
pub trait BalanceLookup {
    /// XRP balance of `address` as a decimal string.
    async fn lookup(&self, address: &str) -> WalletResult<String>;
}

#[cfg(feature = "native")]
pub use http::HttpBalanceLookup;

#[cfg(feature = "native")]
mod http {
    use super::*;

    /// reqwest client for the balance endpoint.
    #[derive(Debug, Clone)]
    pub struct HttpBalanceLookup {
        client: reqwest::Client,
        endpoint: String,
    }

    impl HttpBalanceLookup {
        pub fn new(endpoint: impl Into<String>) -> Self {
            Self::with_client(reqwest::Client::new(), endpoint)
        }

        pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
            Self { client, endpoint: endpoint.into() }
        }
    }

    #[async_trait(?Send)]
    impl BalanceLookup for HttpBalanceLookup {
        async fn lookup(&self, address: &str) -> WalletResult<String> {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("address", address)])
                .send()
                .await
                .map_err(|e| WalletError::BalanceLookup(e.to_string()))?;
            // Error statuses still carry the JSON body
            let body: BalanceResponse = response
                .json()
                .await
                .map_err(|e| WalletError::BalanceLookup(format!("bad response: {e}")))?;
            body.into_result()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let ok: BalanceResponse = serde_json::from_str(r#"{"success":true,"balance":"25.5"}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), "25.5");

        let err: BalanceResponse =
            serde_json::from_str(r#"{"success":false,"error":"Account not found"}"#).unwrap();
        let msg = err.into_result().unwrap_err().to_string();
        assert!(msg.contains("Account not found"));

        let v = serde_json::to_value(BalanceResponse::ok("1")).unwrap();
        assert!(v.get("error").is_none());
    }

    #[test]
    fn success_without_balance_is_an_error() {
        let odd = BalanceResponse { success: true, balance: None, error: None };
        assert!(odd.into_result().is_err());
    }
}
