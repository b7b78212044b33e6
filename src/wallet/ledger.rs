//! XRPL slot: GemWallet negotiation and balance reads

use std::rc::Rc;

use tracing::{debug, info, warn};

use super::manager::{Connection, WalletManager};
use crate::core::keys::gem;
use crate::error::{WalletError, WalletResult};
use crate::provider::LedgerWallet;
use crate::runtime::with_timeout;
use crate::session::WalletKind;

/// Shown when no balance source answers. Never a made-up non-zero value.
pub(super) const ZERO_BALANCE: &str = "0";

impl WalletManager {
    pub(super) fn ledger_wallet(&self) -> WalletResult<Rc<dyn LedgerWallet>> {
        self.inner
            .ports
            .ledger
            .clone()
            .ok_or_else(|| WalletError::NotDetected(WalletKind::Gem.to_string()))
    }

    pub(super) async fn negotiate_ledger(&self) -> WalletResult<Connection> {
        let config = self.config();
        let wallet = self.ledger_wallet()?;

        // The install check hangs when the extension is missing
        let installed = with_timeout(
            self.scheduler(),
            config.install_check_timeout,
            gem::IS_INSTALLED,
            wallet.is_installed(),
        )
        .await
        .and_then(|r| r)
        .unwrap_or_else(|e| {
            debug!(error = %e, "install check failed");
            false
        });
        if !installed {
            return Err(WalletError::NotDetected(WalletKind::Gem.to_string()));
        }

        let address = with_timeout(
            self.scheduler(),
            config.address_timeout,
            gem::GET_ADDRESS,
            wallet.get_address(),
        )
        .await??
        .ok_or(WalletError::NoAddress)?;
        debug!(%address, "ledger address received");

        match with_timeout(self.scheduler(), config.ledger_timeout, gem::GET_NETWORK, wallet.get_network()).await {
            Ok(Ok(Some(network))) => info!(network = %network.network, "ledger network"),
            Ok(Ok(None)) => debug!("ledger network unknown"),
            Ok(Err(e)) | Err(e) => debug!(error = %e, "ledger network lookup failed"),
        }

        let balance = match self.ledger_balance(wallet.as_ref(), &address).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(error = %e, "no ledger balance source answered");
                ZERO_BALANCE.to_string()
            }
        };
        Ok((address, Some(balance)))
    }

    /// Balance from the wallet itself, else from the fallback endpoint.
    pub(super) async fn ledger_balance(&self, wallet: &dyn LedgerWallet, address: &str) -> WalletResult<String> {
        let config = self.config();
        let direct = with_timeout(self.scheduler(), config.ledger_timeout, gem::GET_BALANCE, wallet.get_balance())
            .await
            .and_then(|r| r);
        match direct {
            Ok(Some(balance)) => return Ok(balance),
            Ok(None) => debug!("wallet did not report a balance"),
            Err(e) => debug!(error = %e, "wallet balance lookup failed"),
        }

        let lookup = self
            .inner
            .ports
            .balance_lookup
            .clone()
            .ok_or_else(|| WalletError::BalanceLookup("no fallback endpoint configured".into()))?;
        with_timeout(self.scheduler(), config.ledger_timeout, "balance lookup", lookup.lookup(address)).await?
    }
}
