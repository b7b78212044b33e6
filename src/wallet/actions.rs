//! Payment and staking passthroughs
//!
//! Thin wrappers: validate input, make one wallet call, map the error.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::manager::WalletManager;
use crate::core::address::validate_xrpl_address;
use crate::core::keys::{evm, gem};
use crate::core::units;
use crate::error::{WalletError, WalletResult};
use crate::runtime::with_timeout;
use crate::session::WalletKind;

/// Result of `send_payment`, shaped for the booking UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaymentOutcome {
    pub fn success(hash: impl Into<String>) -> Self {
        Self { success: true, hash: Some(hash.into()), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, hash: None, error: Some(error.into()) }
    }
}

impl From<WalletResult<String>> for PaymentOutcome {
    fn from(result: WalletResult<String>) -> Self {
        match result {
            Ok(hash) => Self::success(hash),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// XRPL `Payment` with an optional hex-encoded memo. `amount` is in drops.
pub fn payment_transaction(destination: &str, amount: &str, memo: Option<&str>) -> Value {
    let mut tx = json!({
        "TransactionType": "Payment",
        "Destination": destination,
        "Amount": amount,
    });
    if let Some(memo) = memo.filter(|m| !m.is_empty()) {
        tx["Memos"] = json!([{ "Memo": { "MemoData": hex::encode_upper(memo.as_bytes()) } }]);
    }
    tx
}

impl WalletManager {
    /// Send an XRPL payment through the ledger wallet. `amount` is in drops;
    /// the caller converts units. Input is validated before the wallet is
    /// touched.
    pub async fn send_payment(&self, destination: &str, amount: &str, memo: Option<&str>) -> PaymentOutcome {
        let outcome = PaymentOutcome::from(self.try_send_payment(destination, amount, memo).await);
        match &outcome.hash {
            Some(hash) => info!(%destination, %hash, "payment submitted"),
            None => warn!(%destination, error = ?outcome.error, "payment failed"),
        }
        outcome
    }

    async fn try_send_payment(&self, destination: &str, amount: &str, memo: Option<&str>) -> WalletResult<String> {
        let destination = destination.trim();
        validate_xrpl_address(destination)?;
        let drops = units::parse_positive_units(amount, 0)?;
        let wallet = self.ledger_wallet()?;

        let tx = payment_transaction(destination, &drops.to_string(), memo);
        let submitted = with_timeout(
            self.scheduler(),
            self.config().transaction_timeout,
            gem::SUBMIT_TRANSACTION,
            wallet.submit_transaction(tx),
        )
        .await?;

        match submitted {
            Ok(Some(hash)) => Ok(hash),
            Ok(None) => Err(WalletError::PaymentFailed("wallet returned no transaction hash".into())),
            Err(e @ WalletError::UserRejected) => Err(e),
            Err(e) => Err(WalletError::PaymentFailed(e.to_string())),
        }
    }

    /// Send `amount` (decimal, native units) to the staking contract.
    pub async fn stake(&self, amount: &str) -> WalletResult<String> {
        let wei = units::parse_positive_units(amount, self.config().chain.decimals)?;
        let hash = self
            .send_contract_call(units::to_hex_quantity(wei), evm::STAKE_SELECTOR.to_string())
            .await?;
        info!(%amount, %hash, "stake submitted");
        Ok(hash)
    }

    /// Ask the staking contract to release `amount` (decimal, native units).
    pub async fn unstake(&self, amount: &str) -> WalletResult<String> {
        let wei = units::parse_positive_units(amount, self.config().chain.decimals)?;
        let data = format!("{}{wei:064x}", evm::UNSTAKE_SELECTOR);
        let hash = self.send_contract_call(units::to_hex_quantity(0), data).await?;
        info!(%amount, %hash, "unstake submitted");
        Ok(hash)
    }

    async fn send_contract_call(&self, value: String, data: String) -> WalletResult<String> {
        let from = {
            let session = self.session();
            let slot = session.slot(WalletKind::Metamask);
            match &slot.address {
                Some(address) if session.is_ready(WalletKind::Metamask) => address.clone(),
                _ => return Err(WalletError::NotConnected(WalletKind::Metamask)),
            }
        };
        let provider = self.evm_provider()?;

        let tx = json!([{
            "from": from,
            "to": self.config().staking_contract,
            "value": value,
            "data": data,
        }]);
        let result = with_timeout(
            self.scheduler(),
            self.config().transaction_timeout,
            evm::SEND_TRANSACTION,
            provider.request(evm::SEND_TRANSACTION, tx),
        )
        .await??;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::MalformedResponse(format!("transaction hash {result}")))
    }
}
