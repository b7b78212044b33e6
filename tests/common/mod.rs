//! Scripted wallets and helpers shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use cribwallet::provider::LedgerNetwork;
use cribwallet::{
    BalanceLookup, EvmProvider, LedgerWallet, MemoryStorage, ProviderAnnouncement, ProviderError,
    ProviderInfo, ProviderRegistry, SessionConfig, StaticLocation, TokioScheduler, WalletError,
    WalletManager, WalletPorts, WalletResult,
};
use serde_json::{json, Value};

pub const EVM_ADDRESS: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
pub const XRPL_ADDRESS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
pub const XRPL_DESTINATION: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";
pub const TX_HASH: &str = "0x9fc76417374aa880d4449a1f7f31ec597f00b1f6f3dd2d66f4c9c6c445836d8b";

/// Drive a test on a current-thread runtime with paused time inside a
/// `LocalSet`, the way the manager runs in production.
pub fn run_local<F: Future>(fut: F) -> F::Output {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .expect("runtime");
    tokio::task::LocalSet::new().block_on(&rt, fut)
}

// =============================================================================
// EVM provider
// =============================================================================

/// EIP-1193 provider answering from a per-method script.
pub struct ScriptedEvm {
    responses: RefCell<HashMap<String, Result<Value, ProviderError>>>,
    delays: RefCell<HashMap<String, Duration>>,
    calls: RefCell<Vec<(String, Value)>>,
}

impl ScriptedEvm {
    /// A MetaMask that grants `address`, knows the chain and holds `balance_hex` wei.
    pub fn metamask(address: &str, balance_hex: &str) -> Rc<Self> {
        let evm = Rc::new(Self {
            responses: RefCell::new(HashMap::new()),
            delays: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
        });
        evm.respond("eth_requestAccounts", Ok(json!([address])));
        evm.respond("wallet_switchEthereumChain", Ok(Value::Null));
        evm.respond("wallet_addEthereumChain", Ok(Value::Null));
        evm.respond("eth_getBalance", Ok(json!(balance_hex)));
        evm.respond("eth_sendTransaction", Ok(json!(TX_HASH)));
        evm
    }

    pub fn respond(&self, method: &str, result: Result<Value, ProviderError>) {
        self.responses.borrow_mut().insert(method.to_string(), result);
    }

    pub fn delay(&self, method: &str, by: Duration) {
        self.delays.borrow_mut().insert(method.to_string(), by);
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .borrow()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait(?Send)]
impl EvmProvider for ScriptedEvm {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.borrow_mut().push((method.to_string(), params));
        let delay = self.delays.borrow().get(method).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .borrow()
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::new(4200, format!("unsupported method {method}"))))
    }
}

pub fn announce_metamask(registry: &ProviderRegistry, evm: Rc<ScriptedEvm>) {
    let info = ProviderInfo::new("7d1c-metamask", "MetaMask").with_rdns("io.metamask");
    registry.announce(ProviderAnnouncement::new(info, evm));
}

// =============================================================================
// Ledger wallet
// =============================================================================

#[derive(Debug, Clone)]
pub enum Submit {
    Hash(String),
    Reject,
    NoHash,
}

/// GemWallet stand-in.
pub struct ScriptedGem {
    pub installed: Cell<bool>,
    pub hang_install: Cell<bool>,
    pub address: RefCell<Option<String>>,
    pub balance: RefCell<Option<String>>,
    pub submit: RefCell<Submit>,
    pub submissions: RefCell<Vec<Value>>,
    pub address_delay: Cell<Option<Duration>>,
}

impl ScriptedGem {
    pub fn new(address: &str, balance: Option<&str>) -> Rc<Self> {
        Rc::new(Self {
            installed: Cell::new(true),
            hang_install: Cell::new(false),
            address: RefCell::new(Some(address.to_string())),
            balance: RefCell::new(balance.map(str::to_string)),
            submit: RefCell::new(Submit::Hash("A1B2C3".into())),
            submissions: RefCell::new(Vec::new()),
            address_delay: Cell::new(None),
        })
    }

    pub fn set_balance(&self, balance: Option<&str>) {
        *self.balance.borrow_mut() = balance.map(str::to_string);
    }
}

#[async_trait(?Send)]
impl LedgerWallet for ScriptedGem {
    async fn is_installed(&self) -> WalletResult<bool> {
        if self.hang_install.get() {
            futures::future::pending::<()>().await;
        }
        Ok(self.installed.get())
    }

    async fn get_address(&self) -> WalletResult<Option<String>> {
        if let Some(delay) = self.address_delay.get() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.address.borrow().clone())
    }

    async fn get_network(&self) -> WalletResult<Option<LedgerNetwork>> {
        Ok(Some(LedgerNetwork { network: "Testnet".into(), websocket: None }))
    }

    async fn get_balance(&self) -> WalletResult<Option<String>> {
        Ok(self.balance.borrow().clone())
    }

    async fn submit_transaction(&self, tx: Value) -> WalletResult<Option<String>> {
        self.submissions.borrow_mut().push(tx);
        match self.submit.borrow().clone() {
            Submit::Hash(hash) => Ok(Some(hash)),
            Submit::Reject => Err(WalletError::UserRejected),
            Submit::NoHash => Ok(None),
        }
    }
}

// =============================================================================
// Balance fallback
// =============================================================================

pub struct StubLookup {
    pub answer: RefCell<Result<String, String>>,
    pub calls: Cell<usize>,
}

impl StubLookup {
    pub fn new(answer: Result<&str, &str>) -> Rc<Self> {
        Rc::new(Self {
            answer: RefCell::new(answer.map(str::to_string).map_err(str::to_string)),
            calls: Cell::new(0),
        })
    }
}

#[async_trait(?Send)]
impl BalanceLookup for StubLookup {
    async fn lookup(&self, _address: &str) -> WalletResult<String> {
        self.calls.set(self.calls.get() + 1);
        self.answer.borrow().clone().map_err(WalletError::BalanceLookup)
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub manager: WalletManager,
    pub storage: MemoryStorage,
    pub registry: Rc<ProviderRegistry>,
}

pub struct HarnessBuilder {
    config: SessionConfig,
    storage: MemoryStorage,
    evm: Option<Rc<ScriptedEvm>>,
    gem: Option<Rc<ScriptedGem>>,
    lookup: Option<Rc<StubLookup>>,
    location: String,
}

impl HarnessBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            storage: MemoryStorage::new(),
            evm: None,
            gem: None,
            lookup: None,
            location: "/".into(),
        }
    }

    pub fn storage(mut self, storage: MemoryStorage) -> Self {
        self.storage = storage;
        self
    }

    pub fn evm(mut self, evm: Rc<ScriptedEvm>) -> Self {
        self.evm = Some(evm);
        self
    }

    pub fn gem(mut self, gem: Rc<ScriptedGem>) -> Self {
        self.gem = Some(gem);
        self
    }

    pub fn lookup(mut self, lookup: Rc<StubLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn location(mut self, path: &str) -> Self {
        self.location = path.into();
        self
    }

    pub fn build(self) -> Harness {
        let registry = Rc::new(ProviderRegistry::new());
        if let Some(evm) = self.evm {
            announce_metamask(&registry, evm);
        }
        let mut ports = WalletPorts::new(Rc::new(self.storage.clone()), Rc::new(TokioScheduler))
            .with_registry(registry.clone())
            .with_location(Rc::new(StaticLocation(self.location)));
        if let Some(gem) = self.gem {
            ports = ports.with_ledger(gem);
        }
        if let Some(lookup) = self.lookup {
            ports = ports.with_balance_lookup(lookup);
        }
        Harness {
            manager: WalletManager::new(self.config, ports),
            storage: self.storage,
            registry,
        }
    }
}

/// Both wallets scripted with healthy defaults.
pub fn both_wallets(config: SessionConfig) -> (Harness, Rc<ScriptedEvm>, Rc<ScriptedGem>) {
    let evm = ScriptedEvm::metamask(EVM_ADDRESS, "0x1bc16d674ec80000");
    let gem = ScriptedGem::new(XRPL_ADDRESS, Some("25.5000"));
    let harness = HarnessBuilder::new(config).evm(evm.clone()).gem(gem.clone()).build();
    (harness, evm, gem)
}
