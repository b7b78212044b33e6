//! rippled JSON-RPC client for `account_info`

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::core::units;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Account not found")]
    AccountNotFound,
    #[error("{0}")]
    Upstream(String),
}

/// Where the balance API reads balances from.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Balance of a validated classic address, in XRP.
    async fn xrp_balance(&self, address: &str) -> Result<String, SourceError>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Value,
}

#[derive(Debug, Clone)]
pub struct XrplRpcClient {
    client: reqwest::Client,
    url: String,
}

impl XrplRpcClient {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn account_info(&self, address: &str) -> Result<Value, SourceError> {
        let body = json!({
            "method": "account_info",
            "params": [{ "account": address, "ledger_index": "validated" }],
        });
        let envelope: RpcEnvelope = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SourceError::Upstream(e.to_string()))?
            .json()
            .await
            .map_err(|e| SourceError::Upstream(format!("bad rpc response: {e}")))?;
        debug!(%address, "account_info answered");
        Ok(envelope.result)
    }
}

/// Pull the XRP balance out of an `account_info` result.
pub fn balance_from_account_info(result: &Value) -> Result<String, SourceError> {
    if let Some(error) = result.get("error").and_then(Value::as_str) {
        return Err(match error {
            "actNotFound" => SourceError::AccountNotFound,
            other => SourceError::Upstream(
                result
                    .get("error_message")
                    .and_then(Value::as_str)
                    .unwrap_or(other)
                    .to_string(),
            ),
        });
    }
    let drops = result
        .pointer("/account_data/Balance")
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::Upstream("account_info carried no balance".into()))?;
    let drops: u128 = drops
        .parse()
        .map_err(|_| SourceError::Upstream(format!("unreadable balance {drops:?}")))?;
    Ok(units::format_drops(drops))
}

#[async_trait]
impl BalanceSource for XrplRpcClient {
    async fn xrp_balance(&self, address: &str) -> Result<String, SourceError> {
        let result = self.account_info(address).await?;
        balance_from_account_info(&result)
    }
}
