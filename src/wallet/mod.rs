//! Wallet session manager
//!
//! ```text
//! WalletManager (Rc handle, one per page)
//!   │
//!   ├── WalletSession      pure transitions (session::*)
//!   ├── SwitchHistory      newest-first switch log
//!   │
//!   ├── ProviderRegistry   EIP-6963 providers → EVM connect (evm.rs)
//!   ├── LedgerWallet       GemWallet → XRPL connect (ledger.rs)
//!   ├── BalanceLookup      fallback for ledger balances
//!   │
//!   ├── SessionStorage     session + history JSON
//!   ├── Scheduler          timeouts + refresh loop (refresh.rs)
//!   └── EventBus           Updated / Switched notifications
//! ```
//!
//! Every mutation goes through `WalletManager::update`, which applies a
//! transition, persists the result and emits `SessionEvent::Updated`.

mod actions;
mod evm;
mod ledger;
mod manager;
mod refresh;

pub use actions::PaymentOutcome;
pub use manager::WalletManager;

use std::rc::Rc;

use crate::provider::{BalanceLookup, LedgerWallet, ProviderRegistry};
use crate::runtime::Scheduler;
use crate::storage::SessionStorage;

/// Where the page currently is. Recorded with every wallet switch.
pub trait PageLocation {
    fn path(&self) -> String;
}

/// A fixed location, for the CLI and tests.
#[derive(Debug, Clone)]
pub struct StaticLocation(pub String);

impl Default for StaticLocation {
    fn default() -> Self {
        Self("/".into())
    }
}

impl PageLocation for StaticLocation {
    fn path(&self) -> String {
        self.0.clone()
    }
}

/// Everything the manager talks to.
#[derive(Clone)]
pub struct WalletPorts {
    pub storage: Rc<dyn SessionStorage>,
    pub scheduler: Rc<dyn Scheduler>,
    pub registry: Rc<ProviderRegistry>,
    pub ledger: Option<Rc<dyn LedgerWallet>>,
    pub balance_lookup: Option<Rc<dyn BalanceLookup>>,
    pub location: Rc<dyn PageLocation>,
}

impl WalletPorts {
    pub fn new(storage: Rc<dyn SessionStorage>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            storage,
            scheduler,
            registry: Rc::new(ProviderRegistry::new()),
            ledger: None,
            balance_lookup: None,
            location: Rc::new(StaticLocation::default()),
        }
    }

    pub fn with_registry(mut self, registry: Rc<ProviderRegistry>) -> Self { self.registry = registry; self }
    pub fn with_ledger(mut self, ledger: Rc<dyn LedgerWallet>) -> Self { self.ledger = Some(ledger); self }
    pub fn with_balance_lookup(mut self, lookup: Rc<dyn BalanceLookup>) -> Self { self.balance_lookup = Some(lookup); self }
    pub fn with_location(mut self, location: Rc<dyn PageLocation>) -> Self { self.location = location; self }
}
