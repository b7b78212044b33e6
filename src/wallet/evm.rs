//! EVM slot: provider negotiation and balance reads

use std::rc::Rc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::manager::{Connection, WalletManager};
use crate::core::keys::evm;
use crate::core::units;
use crate::error::{WalletError, WalletResult};
use crate::provider::EvmProvider;
use crate::runtime::with_timeout;
use crate::session::WalletKind;

impl WalletManager {
    pub(super) async fn negotiate_evm(&self) -> WalletResult<Connection> {
        let config = self.config();
        let provider = self
            .inner
            .ports
            .registry
            .locate(&config.evm_provider_hint, self.scheduler(), config.discovery_timeout)
            .await
            .ok_or_else(|| WalletError::NotDetected(WalletKind::Metamask.to_string()))?;

        let accounts = with_timeout(
            self.scheduler(),
            config.request_timeout,
            evm::REQUEST_ACCOUNTS,
            provider.request(evm::REQUEST_ACCOUNTS, json!([])),
        )
        .await??;
        let address = first_account(&accounts)?;
        debug!(%address, "account access granted");

        self.ensure_chain(provider.as_ref()).await;

        let balance = self.evm_balance(provider.as_ref(), &address).await?;
        Ok((address, Some(balance)))
    }

    /// Switch to the target chain, adding it when the wallet does not know
    /// it. Never fails the connect.
    async fn ensure_chain(&self, provider: &dyn EvmProvider) {
        let chain = &self.config().chain;
        let switched = with_timeout(
            self.scheduler(),
            self.config().request_timeout,
            evm::SWITCH_CHAIN,
            provider.request(evm::SWITCH_CHAIN, chain.switch_chain_params()),
        )
        .await;

        match switched {
            Ok(Ok(_)) => debug!(chain_id = chain.chain_id, "chain selected"),
            Ok(Err(e)) if e.is_unrecognized_chain() => {
                let added = with_timeout(
                    self.scheduler(),
                    self.config().request_timeout,
                    evm::ADD_CHAIN,
                    provider.request(evm::ADD_CHAIN, chain.add_chain_params()),
                )
                .await;
                match added {
                    Ok(Ok(_)) => info!(chain = %chain.chain_name, "chain added to wallet"),
                    Ok(Err(e)) => warn!(error = %e, "wallet refused to add chain"),
                    Err(e) => warn!(error = %e, "adding chain did not finish"),
                }
            }
            Ok(Err(e)) => warn!(error = %e, "chain switch failed"),
            Err(e) => warn!(error = %e, "chain switch did not finish"),
        }
    }

    /// Native balance as a 4-digit display string. Zero becomes the demo
    /// balance when one is configured.
    pub(super) async fn evm_balance(&self, provider: &dyn EvmProvider, address: &str) -> WalletResult<String> {
        let config = self.config();
        let raw = with_timeout(
            self.scheduler(),
            config.balance_timeout,
            evm::GET_BALANCE,
            provider.request(evm::GET_BALANCE, json!([address, "latest"])),
        )
        .await??;

        let wei = match &raw {
            Value::String(s) => units::parse_hex_quantity(s)?,
            other => {
                return Err(WalletError::MalformedResponse(format!("balance {other}")));
            }
        };
        if wei == 0 {
            if let Some(demo) = &config.demo_balance {
                return Ok(demo.clone());
            }
        }
        Ok(units::format_units(wei, config.chain.decimals, units::DISPLAY_PRECISION))
    }

    /// The provider to use for an already-connected EVM slot.
    pub(super) fn evm_provider(&self) -> WalletResult<Rc<dyn EvmProvider>> {
        self.inner
            .ports
            .registry
            .resolve(&self.config().evm_provider_hint)
            .ok_or_else(|| WalletError::NotDetected(WalletKind::Metamask.to_string()))
    }
}

fn first_account(accounts: &Value) -> WalletResult<String> {
    let list = accounts
        .as_array()
        .ok_or_else(|| WalletError::MalformedResponse(format!("accounts {accounts}")))?;
    list.iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|a| !a.is_empty())
        .map(str::to_string)
        .ok_or(WalletError::NoAccounts)
}
