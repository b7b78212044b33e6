use std::cell::{Ref, RefCell};
use std::rc::Rc;

use chrono::Utc;
use futures::channel::mpsc;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::WalletPorts;
use crate::config::SessionConfig;
use crate::error::{WalletError, WalletResult};
use crate::events::{EventBus, SessionEvent, WalletSwitched};
use crate::provider::ProviderInfo;
use crate::runtime::{Scheduler, TaskHandle};
use crate::session::{
    ConnectionStatus, HistoryEntry, PersistedSession, SessionSnapshot, SwitchHistory, WalletKind, WalletSession,
};

/// Address and display balance produced by a successful negotiation.
pub(super) type Connection = (String, Option<String>);

pub(super) struct Inner {
    pub(super) config: SessionConfig,
    pub(super) ports: WalletPorts,
    session: RefCell<WalletSession>,
    history: RefCell<SwitchHistory>,
    /// Per-slot attempt counter. A connect that finds it changed is stale.
    epochs: RefCell<[u64; 2]>,
    /// Epoch of the interactive connect still awaiting its wallet, per slot.
    in_flight: RefCell<[Option<u64>; 2]>,
    pub(super) refresh: RefCell<Option<TaskHandle>>,
    events: EventBus,
}

/// Single-threaded wallet session handle. Clones share the same session.
#[derive(Clone)]
pub struct WalletManager {
    pub(super) inner: Rc<Inner>,
}

impl WalletManager {
    pub fn new(config: SessionConfig, ports: WalletPorts) -> Self {
        #[cfg(feature = "native")]
        let ports = match (&ports.balance_lookup, &config.balance_endpoint) {
            (None, Some(endpoint)) => {
                let lookup = crate::provider::HttpBalanceLookup::new(endpoint.clone());
                ports.with_balance_lookup(Rc::new(lookup))
            }
            _ => ports,
        };

        let history = SwitchHistory::new(config.history_limit);
        Self {
            inner: Rc::new(Inner {
                config,
                ports,
                session: RefCell::new(WalletSession::new()),
                history: RefCell::new(history),
                epochs: RefCell::new([0; 2]),
                in_flight: RefCell::new([None; 2]),
                refresh: RefCell::new(None),
                events: EventBus::new(),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub(super) fn scheduler(&self) -> &dyn Scheduler {
        self.inner.ports.scheduler.as_ref()
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn session(&self) -> Ref<'_, WalletSession> {
        self.inner.session.borrow()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session().snapshot()
    }

    /// Switch history, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.history.borrow().entries()
    }

    /// EVM providers announced so far.
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.inner.ports.registry.providers()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Mount
    // =========================================================================

    /// Load the persisted session and history. Status always starts
    /// disconnected; unreadable documents are dropped. Nothing is written.
    pub fn hydrate(&self) {
        let config = &self.inner.config;
        let session = self
            .load::<PersistedSession>(&config.session_key)
            .map(WalletSession::from_persisted)
            .unwrap_or_default();
        let history = self
            .load::<Vec<HistoryEntry>>(&config.history_key)
            .map(|entries| SwitchHistory::from_entries(entries, config.history_limit))
            .unwrap_or_else(|| SwitchHistory::new(config.history_limit));

        debug!(
            pending = ?session.pending_restores(),
            history = history.len(),
            "session hydrated"
        );
        *self.inner.history.borrow_mut() = history;
        self.transition(|s| *s = session, false);
    }

    /// Hydrate, discover providers, silently reconnect restored slots and
    /// start polling balances.
    pub async fn mount(&self) {
        self.hydrate();

        let config = &self.inner.config;
        let found = self
            .inner
            .ports
            .registry
            .refresh(self.scheduler(), config.discovery_timeout)
            .await;
        debug!(providers = found, "provider discovery finished");

        let pending = self.session().pending_restores();
        join_all(pending.into_iter().map(|kind| self.restore(kind))).await;

        if self.session().any_connected() {
            self.ensure_refresh();
        }
    }

    async fn restore(&self, kind: WalletKind) {
        let epoch = self.bump_epoch(kind);
        let result = self.negotiate(kind).await;
        match self.finish_attempt(kind, epoch, result, true) {
            Ok(address) => info!(wallet = %kind, %address, "session restored"),
            Err(WalletError::Superseded) => {}
            Err(e) => debug!(wallet = %kind, error = %e, "silent reconnect gave up"),
        }
    }

    // =========================================================================
    // Connect
    // =========================================================================

    /// Connect the EVM slot. The error is also written to `lastError`.
    pub async fn connect_metamask(&self) -> WalletResult<String> {
        self.connect(WalletKind::Metamask).await
    }

    /// Connect the XRPL slot. The error is also written to `lastError`.
    pub async fn connect_gem(&self) -> WalletResult<String> {
        self.connect(WalletKind::Gem).await
    }

    pub async fn connect(&self, kind: WalletKind) -> WalletResult<String> {
        let epoch = self.bump_epoch(kind);
        self.inner.in_flight.borrow_mut()[kind.index()] = Some(epoch);
        self.update(|s| s.begin_connect());
        info!(wallet = %kind, "connecting");
        let result = self.negotiate(kind).await;
        {
            let mut in_flight = self.inner.in_flight.borrow_mut();
            if in_flight[kind.index()] == Some(epoch) {
                in_flight[kind.index()] = None;
            }
        }
        self.finish_attempt(kind, epoch, result, false)
    }

    async fn negotiate(&self, kind: WalletKind) -> WalletResult<Connection> {
        match kind {
            WalletKind::Metamask => self.negotiate_evm().await,
            WalletKind::Gem => self.negotiate_ledger().await,
        }
    }

    fn finish_attempt(
        &self,
        kind: WalletKind,
        epoch: u64,
        result: WalletResult<Connection>,
        silent: bool,
    ) -> WalletResult<String> {
        if self.epoch(kind) != epoch {
            debug!(wallet = %kind, "discarding superseded connect result");
            return Err(WalletError::Superseded);
        }

        match result {
            Ok((address, balance)) => {
                if silent {
                    let busy = self.connecting_elsewhere(kind);
                    self.update(|s| {
                        s.complete_restore(kind, address.clone(), balance);
                        if busy {
                            s.connection_status = ConnectionStatus::Connecting;
                        }
                    });
                } else {
                    self.update(|s| s.complete_connect(kind, address.clone(), balance));
                    info!(wallet = %kind, %address, "connected");
                }
                self.ensure_refresh();
                Ok(address)
            }
            Err(e) if silent => {
                self.clear_slot(kind);
                Err(e)
            }
            Err(e) => {
                warn!(wallet = %kind, error = %e, "connect failed");
                let message = e.to_string();
                self.update(|s| s.fail_connect(message));
                Err(e)
            }
        }
    }

    // =========================================================================
    // Disconnect / switch
    // =========================================================================

    /// Clear a slot. In-flight connects for it are discarded.
    pub fn disconnect(&self, kind: WalletKind) {
        self.bump_epoch(kind);
        self.clear_slot(kind);
        info!(wallet = %kind, "disconnected");
    }

    /// Disconnect everything and erase persisted state.
    pub fn reset(&self) {
        for kind in WalletKind::ALL {
            self.disconnect(kind);
        }
    }

    fn clear_slot(&self, kind: WalletKind) {
        let busy = self.connecting_elsewhere(kind);
        let nothing_left = self.update(|s| {
            let nothing_left = s.disconnect(kind);
            if busy {
                s.connection_status = ConnectionStatus::Connecting;
            }
            nothing_left
        });
        if nothing_left {
            self.stop_refresh();
            self.inner.history.borrow_mut().clear();
            self.erase_persisted();
        }
    }

    /// Make a connected slot the active wallet and log the switch. Slots
    /// still awaiting their silent reconnect are refused.
    pub fn switch_wallet(&self, kind: WalletKind) -> WalletResult<WalletSwitched> {
        if !self.session().is_ready(kind) {
            return Err(WalletError::NotConnected(kind));
        }
        let previous_wallet = self.update(|s| s.switch_to(kind))?;

        let timestamp = Utc::now();
        let url = self.inner.ports.location.path();
        self.inner
            .history
            .borrow_mut()
            .record(HistoryEntry::new(kind, timestamp, url));
        self.persist_history();

        let switched = WalletSwitched { previous_wallet, new_wallet: kind, timestamp };
        info!(from = previous_wallet.as_str(), to = kind.as_str(), "wallet switched");
        self.inner.events.emit(SessionEvent::Switched(switched.clone()));
        Ok(switched)
    }

    // =========================================================================
    // Update path
    // =========================================================================

    /// Apply a transition, persist the session and notify subscribers.
    pub(super) fn update<R>(&self, apply: impl FnOnce(&mut WalletSession) -> R) -> R {
        self.transition(apply, true)
    }

    /// A session with no connected slot is removed from storage, not written.
    fn transition<R>(&self, apply: impl FnOnce(&mut WalletSession) -> R, persist: bool) -> R {
        let (result, live, persisted, snapshot) = {
            let mut session = self.inner.session.borrow_mut();
            let result = apply(&mut session);
            debug_assert!(session.check_invariants().is_ok(), "{:?}", session.check_invariants());
            (result, session.any_connected(), session.to_persisted(), session.snapshot())
        };
        if persist {
            let key = &self.inner.config.session_key;
            if live {
                self.store(key, &persisted);
            } else {
                self.remove(key);
            }
        }
        self.inner.events.emit(SessionEvent::Updated(snapshot));
        result
    }

    pub(super) fn epoch(&self, kind: WalletKind) -> u64 {
        self.inner.epochs.borrow()[kind.index()]
    }

    /// Whether the other slot has an interactive connect that can still land.
    fn connecting_elsewhere(&self, kind: WalletKind) -> bool {
        let other = kind.other();
        self.inner.in_flight.borrow()[other.index()] == Some(self.epoch(other))
    }

    fn bump_epoch(&self, kind: WalletKind) -> u64 {
        let mut epochs = self.inner.epochs.borrow_mut();
        let slot = &mut epochs[kind.index()];
        *slot += 1;
        *slot
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn persist_history(&self) {
        let entries = self.history();
        self.store(&self.inner.config.history_key, &entries);
    }

    fn erase_persisted(&self) {
        for key in [&self.inner.config.session_key, &self.inner.config.history_key] {
            self.remove(key);
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.inner.ports.storage.remove(key) {
            warn!(key, error = %e, "failed to erase persisted state");
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(WalletError::from)
            .and_then(|raw| self.inner.ports.storage.set(key, &raw));
        if let Err(e) = result {
            warn!(key, error = %e, "failed to persist");
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.inner.ports.storage.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "failed to read persisted state");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable persisted state");
                self.remove(key);
                None
            }
        }
    }
}
