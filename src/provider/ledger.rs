//! XRPL ledger wallet port (GemWallet)
//!
//! GemWallet has shipped several response shapes over time. The
//! [`normalize`] helpers accept all of them so adapters stay thin.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WalletResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerNetwork {
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket: Option<String>,
}

#[async_trait(?Send)]
pub trait LedgerWallet {
    async fn is_installed(&self) -> WalletResult<bool>;
    async fn get_address(&self) -> WalletResult<Option<String>>;
    async fn get_network(&self) -> WalletResult<Option<LedgerNetwork>>;
    /// Balance in XRP as a decimal string.
    async fn get_balance(&self) -> WalletResult<Option<String>>;
    /// Sign and submit; returns the transaction hash.
    async fn submit_transaction(&self, tx: Value) -> WalletResult<Option<String>>;
}

pub mod normalize {
    use serde_json::Value;

    use super::LedgerNetwork;

    fn result(raw: &Value) -> Option<&Value> {
        raw.get("result").filter(|v| !v.is_null())
    }

    /// `{result: {field}}` first, then the flat `{field}`.
    fn field<'a>(raw: &'a Value, name: &str) -> Option<&'a Value> {
        result(raw)
            .and_then(|r| r.get(name))
            .or_else(|| raw.get(name))
            .filter(|v| !v.is_null())
    }

    fn non_empty(s: &str) -> Option<String> {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    }

    /// Accepts `true`, `{result: true}`, `{result: {isInstalled: true}}` and
    /// `{isInstalled: true}`.
    pub fn install_flag(raw: &Value) -> bool {
        match raw {
            Value::Bool(b) => *b,
            _ => match result(raw) {
                Some(Value::Bool(b)) => *b,
                _ => field(raw, "isInstalled").and_then(Value::as_bool).unwrap_or(false),
            },
        }
    }

    /// The wallet answered with an explicit refusal (`{type: "reject"}`).
    pub fn is_rejected(raw: &Value) -> bool {
        raw.get("type").and_then(Value::as_str) == Some("reject")
    }

    pub fn address(raw: &Value) -> Option<String> {
        match raw {
            Value::String(s) => non_empty(s),
            _ => field(raw, "address").and_then(Value::as_str).and_then(non_empty),
        }
    }

    pub fn network(raw: &Value) -> Option<LedgerNetwork> {
        let network = match raw {
            Value::String(s) => non_empty(s),
            _ => field(raw, "network").and_then(Value::as_str).and_then(non_empty),
        }?;
        let websocket = field(raw, "websocket").and_then(Value::as_str).and_then(non_empty);
        Some(LedgerNetwork { network, websocket })
    }

    /// Balance may arrive as a string or a number.
    pub fn balance(raw: &Value) -> Option<String> {
        let value = match raw {
            Value::String(_) | Value::Number(_) => raw,
            _ => field(raw, "balance")?,
        };
        match value {
            Value::String(s) => non_empty(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn hash(raw: &Value) -> Option<String> {
        match raw {
            Value::String(s) => non_empty(s),
            _ => field(raw, "hash").and_then(Value::as_str).and_then(non_empty),
        }
    }
}
