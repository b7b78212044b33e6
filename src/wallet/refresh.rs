//! Periodic balance refresh
//!
//! One scheduled task per manager, alive while any slot is connected. The
//! task holds a weak reference so a dropped manager ends it.

use std::rc::Rc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::manager::WalletManager;
use crate::error::WalletResult;
use crate::session::WalletKind;

impl WalletManager {
    /// Start the refresh loop unless it is already running.
    pub(super) fn ensure_refresh(&self) {
        let mut slot = self.inner.refresh.borrow_mut();
        if slot.as_ref().is_some_and(|h| h.is_active()) {
            return;
        }

        let weak = Rc::downgrade(&self.inner);
        let scheduler = self.inner.ports.scheduler.clone();
        let interval = self.config().refresh_interval;
        let task = async move {
            loop {
                scheduler.sleep(interval).await;
                let Some(inner) = weak.upgrade() else { break };
                WalletManager { inner }.refresh_balances().await;
            }
        };
        *slot = Some(self.inner.ports.scheduler.schedule(Box::pin(task)));
        debug!(?interval, "balance refresh started");
    }

    pub(super) fn stop_refresh(&self) {
        let handle = self.inner.refresh.borrow_mut().take();
        if let Some(handle) = handle {
            handle.cancel();
            debug!("balance refresh stopped");
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.borrow().as_ref().is_some_and(|h| h.is_active())
    }

    /// Refresh every live slot once. Failures keep the last-known balance.
    pub async fn refresh_balances(&self) {
        let kinds: Vec<WalletKind> = {
            let session = self.session();
            session
                .connected_kinds()
                .into_iter()
                .filter(|k| !session.slot(*k).pending_restore)
                .collect()
        };
        join_all(kinds.into_iter().map(|kind| self.refresh_slot(kind))).await;
    }

    async fn refresh_slot(&self, kind: WalletKind) {
        let epoch = self.epoch(kind);
        let Some(address) = self.session().slot(kind).address.clone() else {
            return;
        };

        match self.fetch_balance(kind, &address).await {
            Ok(balance) => {
                let unchanged = {
                    let session = self.session();
                    let slot = session.slot(kind);
                    slot.address.as_deref() != Some(address.as_str())
                        || slot.balance.as_deref() == Some(balance.as_str())
                };
                if self.epoch(kind) != epoch || unchanged {
                    return;
                }
                debug!(wallet = %kind, %balance, "balance refreshed");
                self.update(|s| s.set_balance(kind, balance));
            }
            Err(e) => warn!(wallet = %kind, error = %e, "balance refresh failed"),
        }
    }

    async fn fetch_balance(&self, kind: WalletKind, address: &str) -> WalletResult<String> {
        match kind {
            WalletKind::Metamask => {
                let provider = self.evm_provider()?;
                self.evm_balance(provider.as_ref(), address).await
            }
            WalletKind::Gem => {
                let wallet = self.ledger_wallet()?;
                self.ledger_balance(wallet.as_ref(), address).await
            }
        }
    }
}
