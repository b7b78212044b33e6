//! Session model: the two wallet slots, the active wallet and the connection
//! status, plus the pure transitions the manager applies to them.
//!
//! Nothing in here performs I/O. The manager owns the ports and calls these
//! transitions from a single update path.

mod history;

pub use history::{HistoryEntry, SwitchHistory, DEFAULT_HISTORY_LIMIT};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

/// The two wallet slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// Slot A: EVM wallet on the XRPL EVM sidechain
    Metamask,
    /// Slot B: XRPL ledger wallet
    Gem,
}

impl WalletKind {
    pub const ALL: [WalletKind; 2] = [WalletKind::Metamask, WalletKind::Gem];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Metamask => "metamask",
            WalletKind::Gem => "gem",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "metamask" | "evm" => Some(WalletKind::Metamask),
            "gem" | "gemwallet" | "xrpl" => Some(WalletKind::Gem),
            _ => None,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            WalletKind::Metamask => WalletKind::Gem,
            WalletKind::Gem => WalletKind::Metamask,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            WalletKind::Metamask => 0,
            WalletKind::Gem => 1,
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletKind::Metamask => f.write_str("MetaMask"),
            WalletKind::Gem => f.write_str("GemWallet"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveWallet {
    #[default]
    None,
    Metamask,
    Gem,
}

impl ActiveWallet {
    pub fn kind(&self) -> Option<WalletKind> {
        match self {
            ActiveWallet::None => None,
            ActiveWallet::Metamask => Some(WalletKind::Metamask),
            ActiveWallet::Gem => Some(WalletKind::Gem),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveWallet::None => "none",
            ActiveWallet::Metamask => "metamask",
            ActiveWallet::Gem => "gem",
        }
    }
}

impl From<WalletKind> for ActiveWallet {
    fn from(kind: WalletKind) -> Self {
        match kind {
            WalletKind::Metamask => ActiveWallet::Metamask,
            WalletKind::Gem => ActiveWallet::Gem,
        }
    }
}

impl From<Option<WalletKind>> for ActiveWallet {
    fn from(kind: Option<WalletKind>) -> Self {
        kind.map(ActiveWallet::from).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// One wallet slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotState {
    pub address: Option<String>,
    pub balance: Option<String>,
    pub connected: bool,
    /// Hydrated as connected but not yet re-validated against the wallet.
    pub pending_restore: bool,
}

impl SlotState {
    fn connected(address: String, balance: Option<String>) -> Self {
        Self { address: Some(address), balance, connected: true, pending_restore: false }
    }
}

/// The whole session. Cloned into snapshots, never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    pub active_wallet: ActiveWallet,
    slots: [SlotState; 2],
    pub connection_status: ConnectionStatus,
    pub last_error: Option<String>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, kind: WalletKind) -> &SlotState {
        &self.slots[kind.index()]
    }

    fn slot_mut(&mut self, kind: WalletKind) -> &mut SlotState {
        &mut self.slots[kind.index()]
    }

    pub fn is_connected(&self, kind: WalletKind) -> bool {
        self.slot(kind).connected
    }

    /// Connected and re-validated since the last reload.
    pub fn is_ready(&self, kind: WalletKind) -> bool {
        let slot = self.slot(kind);
        slot.connected && !slot.pending_restore
    }

    pub fn any_connected(&self) -> bool {
        WalletKind::ALL.iter().any(|k| self.is_connected(*k))
    }

    pub fn connected_kinds(&self) -> Vec<WalletKind> {
        WalletKind::ALL.into_iter().filter(|k| self.is_connected(*k)).collect()
    }

    /// Slots hydrated as connected that still need a silent reconnect.
    pub fn pending_restores(&self) -> Vec<WalletKind> {
        WalletKind::ALL
            .into_iter()
            .filter(|k| self.slot(*k).pending_restore)
            .collect()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    pub fn begin_connect(&mut self) {
        self.connection_status = ConnectionStatus::Connecting;
        self.last_error = None;
    }

    pub fn complete_connect(&mut self, kind: WalletKind, address: String, balance: Option<String>) {
        *self.slot_mut(kind) = SlotState::connected(address, balance);
        self.active_wallet = kind.into();
        self.connection_status = ConnectionStatus::Connected;
    }

    /// Record a failed attempt. Slots are left as they were.
    pub fn fail_connect(&mut self, message: impl Into<String>) {
        self.connection_status = ConnectionStatus::Error;
        self.last_error = Some(message.into());
    }

    /// Derive the status from the slots after a silent outcome.
    pub fn settle_status(&mut self) {
        self.connection_status = if self.any_connected() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
    }

    /// Clear a slot. Returns true when no slot is left connected.
    pub fn disconnect(&mut self, kind: WalletKind) -> bool {
        *self.slot_mut(kind) = SlotState::default();
        if self.active_wallet.kind() == Some(kind) || self.active_wallet.kind().is_none() {
            let other = kind.other();
            self.active_wallet = if self.is_connected(other) {
                other.into()
            } else {
                ActiveWallet::None
            };
        }
        self.settle_status();
        !self.any_connected()
    }

    /// A silent reconnect succeeded. Unlike `complete_connect` the active
    /// wallet is kept unless nothing was active.
    pub fn complete_restore(&mut self, kind: WalletKind, address: String, balance: Option<String>) {
        *self.slot_mut(kind) = SlotState::connected(address, balance);
        if self.active_wallet.kind().is_none() {
            self.active_wallet = kind.into();
        }
        self.settle_status();
    }

    /// Point the active wallet at a ready slot, returning the previous one.
    pub fn switch_to(&mut self, kind: WalletKind) -> WalletResult<ActiveWallet> {
        if !self.is_ready(kind) {
            return Err(WalletError::NotConnected(kind));
        }
        let previous = self.active_wallet;
        self.active_wallet = kind.into();
        Ok(previous)
    }

    /// Update a connected slot's balance. Returns false for disconnected slots.
    pub fn set_balance(&mut self, kind: WalletKind, balance: impl Into<String>) -> bool {
        let slot = self.slot_mut(kind);
        if !slot.connected {
            return false;
        }
        slot.balance = Some(balance.into());
        true
    }

    // =========================================================================
    // Persistence and views
    // =========================================================================

    /// Rebuild a session from storage. Status never survives a reload.
    pub fn from_persisted(persisted: PersistedSession) -> Self {
        let slot = |address: Option<String>, balance: Option<String>, connected: bool| {
            let address = address.filter(|a| !a.trim().is_empty());
            if connected && address.is_some() {
                SlotState { address, balance, connected: true, pending_restore: true }
            } else {
                SlotState::default()
            }
        };

        let mut session = WalletSession {
            active_wallet: persisted.active_wallet,
            slots: [
                slot(persisted.metamask_address, persisted.metamask_balance, persisted.metamask_connected),
                slot(persisted.gem_address, persisted.gem_balance, persisted.gem_connected),
            ],
            connection_status: ConnectionStatus::Disconnected,
            last_error: None,
        };

        let active_ok = session
            .active_wallet
            .kind()
            .map_or(true, |k| session.is_connected(k));
        if !active_ok {
            session.active_wallet = session.connected_kinds().first().copied().into();
        }
        session
    }

    pub fn to_persisted(&self) -> PersistedSession {
        let mm = self.slot(WalletKind::Metamask);
        let gem = self.slot(WalletKind::Gem);
        PersistedSession {
            active_wallet: self.active_wallet,
            metamask_address: mm.address.clone(),
            metamask_balance: mm.balance.clone(),
            metamask_connected: mm.connected,
            gem_address: gem.address.clone(),
            gem_balance: gem.balance.clone(),
            gem_connected: gem.connected,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mm = self.slot(WalletKind::Metamask);
        let gem = self.slot(WalletKind::Gem);
        SessionSnapshot {
            active_wallet: self.active_wallet,
            metamask_address: mm.address.clone(),
            metamask_balance: mm.balance.clone(),
            metamask_connected: mm.connected,
            gem_address: gem.address.clone(),
            gem_balance: gem.balance.clone(),
            gem_connected: gem.connected,
            connection_status: self.connection_status,
            last_error: self.last_error.clone(),
        }
    }

    /// Structural invariants, checked by tests after every transition.
    pub fn check_invariants(&self) -> Result<(), String> {
        for kind in WalletKind::ALL {
            let slot = self.slot(kind);
            if slot.connected && slot.address.is_none() {
                return Err(format!("{kind} is connected without an address"));
            }
            if slot.pending_restore && !slot.connected {
                return Err(format!("{kind} is pending restore but not connected"));
            }
        }
        if let Some(kind) = self.active_wallet.kind() {
            if !self.is_connected(kind) {
                return Err(format!("active wallet {kind} is not connected"));
            }
        }
        if self.connection_status == ConnectionStatus::Connected && !self.any_connected() {
            return Err("status is connected with no connected slot".into());
        }
        Ok(())
    }
}

/// UI-facing flat view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub active_wallet: ActiveWallet,
    pub metamask_address: Option<String>,
    pub metamask_balance: Option<String>,
    pub metamask_connected: bool,
    pub gem_address: Option<String>,
    pub gem_balance: Option<String>,
    pub gem_connected: bool,
    pub connection_status: ConnectionStatus,
    pub last_error: Option<String>,
}

/// What survives a reload: the snapshot without status and error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSession {
    pub active_wallet: ActiveWallet,
    pub metamask_address: Option<String>,
    pub metamask_balance: Option<String>,
    pub metamask_connected: bool,
    pub gem_address: Option<String>,
    pub gem_balance: Option<String>,
    pub gem_connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn both_connected() -> WalletSession {
        let mut s = WalletSession::new();
        s.begin_connect();
        s.complete_connect(WalletKind::Metamask, "0xABC".into(), Some("1.0000".into()));
        s.begin_connect();
        s.complete_connect(WalletKind::Gem, "rGEM".into(), Some("25".into()));
        s
    }

    #[test]
    fn connect_sets_active_and_status() {
        let mut s = WalletSession::new();
        s.begin_connect();
        assert_eq!(s.connection_status, ConnectionStatus::Connecting);
        s.complete_connect(WalletKind::Metamask, "0xABC".into(), Some("0.1250".into()));
        assert_eq!(s.active_wallet, ActiveWallet::Metamask);
        assert_eq!(s.connection_status, ConnectionStatus::Connected);
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn failure_leaves_slots_alone() {
        let mut s = both_connected();
        s.begin_connect();
        s.fail_connect("nope");
        assert_eq!(s.connection_status, ConnectionStatus::Error);
        assert_eq!(s.last_error.as_deref(), Some("nope"));
        assert!(s.is_connected(WalletKind::Gem));
        s.begin_connect();
        assert!(s.last_error.is_none());
    }

    #[test]
    fn disconnect_reassigns_active() {
        let mut s = both_connected();
        assert_eq!(s.active_wallet, ActiveWallet::Gem);
        assert!(!s.disconnect(WalletKind::Gem));
        assert_eq!(s.active_wallet, ActiveWallet::Metamask);
        assert_eq!(s.connection_status, ConnectionStatus::Connected);
        assert!(s.disconnect(WalletKind::Metamask));
        assert_eq!(s.active_wallet, ActiveWallet::None);
        assert_eq!(s.connection_status, ConnectionStatus::Disconnected);
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn disconnecting_inactive_slot_keeps_active() {
        let mut s = both_connected();
        s.switch_to(WalletKind::Metamask).unwrap();
        s.disconnect(WalletKind::Gem);
        assert_eq!(s.active_wallet, ActiveWallet::Metamask);
    }

    #[test]
    fn restore_keeps_active_wallet() {
        let persisted = PersistedSession {
            active_wallet: ActiveWallet::Metamask,
            metamask_address: Some("0xABC".into()),
            metamask_connected: true,
            gem_address: Some("rGEM".into()),
            gem_connected: true,
            ..Default::default()
        };
        let mut s = WalletSession::from_persisted(persisted);
        assert_eq!(s.pending_restores().len(), 2);
        s.complete_restore(WalletKind::Gem, "rGEM".into(), Some("10".into()));
        assert_eq!(s.active_wallet, ActiveWallet::Metamask);
        assert_eq!(s.connection_status, ConnectionStatus::Connected);
        assert_eq!(s.pending_restores(), vec![WalletKind::Metamask]);
    }

    #[test]
    fn switch_requires_connected_slot() {
        let mut s = WalletSession::new();
        s.complete_connect(WalletKind::Metamask, "0xABC".into(), None);
        let err = s.switch_to(WalletKind::Gem).unwrap_err();
        assert!(matches!(err, WalletError::NotConnected(WalletKind::Gem)));
        assert_eq!(s.active_wallet, ActiveWallet::Metamask);
    }

    #[test]
    fn balance_only_on_connected_slot() {
        let mut s = WalletSession::new();
        assert!(!s.set_balance(WalletKind::Gem, "5"));
        assert!(s.slot(WalletKind::Gem).balance.is_none());
    }

    #[test]
    fn hydration_ignores_status_and_repairs() {
        let raw = json!({
            "activeWallet": "gem",
            "metamaskAddress": "0xABC",
            "metamaskBalance": "0.5000",
            "metamaskConnected": true,
            "gemAddress": null,
            "gemConnected": true,
            "connectionStatus": "connecting",
            "lastError": "stale"
        });
        let persisted: PersistedSession = serde_json::from_value(raw).unwrap();
        let s = WalletSession::from_persisted(persisted);
        assert_eq!(s.connection_status, ConnectionStatus::Disconnected);
        assert!(s.last_error.is_none());
        assert!(!s.is_connected(WalletKind::Gem));
        assert_eq!(s.active_wallet, ActiveWallet::Metamask);
        assert_eq!(s.pending_restores(), vec![WalletKind::Metamask]);
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn restored_slot_is_not_ready_until_revalidated() {
        let persisted = PersistedSession {
            active_wallet: ActiveWallet::Gem,
            metamask_address: Some("0xABC".into()),
            metamask_connected: true,
            gem_address: Some("rGem".into()),
            gem_connected: true,
            ..Default::default()
        };
        let mut s = WalletSession::from_persisted(persisted);
        assert!(s.is_connected(WalletKind::Metamask));
        assert!(!s.is_ready(WalletKind::Metamask));
        assert!(matches!(
            s.switch_to(WalletKind::Metamask),
            Err(WalletError::NotConnected(WalletKind::Metamask))
        ));

        s.complete_restore(WalletKind::Metamask, "0xABC".into(), None);
        assert!(s.is_ready(WalletKind::Metamask));
        assert_eq!(s.switch_to(WalletKind::Metamask).unwrap(), ActiveWallet::Gem);
    }

    #[test]
    fn snapshot_is_camel_case() {
        let s = both_connected();
        let v = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(v["activeWallet"], "gem");
        assert_eq!(v["metamaskAddress"], "0xABC");
        assert_eq!(v["connectionStatus"], "connected");
        assert!(v["lastError"].is_null());

        let p = serde_json::to_value(s.to_persisted()).unwrap();
        assert!(p.get("connectionStatus").is_none());
        assert!(p.get("lastError").is_none());
    }

    #[test]
    fn kind_names() {
        assert_eq!(WalletKind::from_str("GemWallet"), Some(WalletKind::Gem));
        assert_eq!(WalletKind::from_str("MetaMask"), Some(WalletKind::Metamask));
        assert_eq!(WalletKind::from_str("phantom"), None);
        assert_eq!(WalletKind::Gem.to_string(), "GemWallet");
    }
}
