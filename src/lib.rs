//! Cribwallet: dual-wallet session manager for Crypto Cribs.
//!
//! One page, two wallets: MetaMask on the XRPL EVM sidechain and GemWallet on
//! the XRP Ledger. Both can be connected at once; one of them is active.
//!
//! # Architecture
//!
//! ```text
//! WalletManager (entry point)
//!   │
//!   ├── WalletSession (session::*)
//!   │     ├── metamask slot   address / balance / connected
//!   │     ├── gem slot        address / balance / connected
//!   │     └── activeWallet, connectionStatus, lastError
//!   │
//!   ├── SwitchHistory         last 10 switches, newest first
//!   │
//!   ├── Ports
//!   │     ├── ProviderRegistry → EvmProvider (EIP-6963 / EIP-1193)
//!   │     ├── LedgerWallet     (GemWallet API)
//!   │     ├── BalanceLookup    (balance API fallback)
//!   │     ├── SessionStorage   (localStorage / files / memory)
//!   │     └── Scheduler        (timeouts, 30s balance refresh)
//!   │
//!   └── EventBus → Updated(snapshot) / Switched(walletSwitched)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Description |
//! |-----------|--------|-------------|
//! | mount | `manager.mount()` | Hydrate, discover, silently restore |
//! | connect | `manager.connect_metamask()` / `connect_gem()` | Interactive connect |
//! | disconnect | `manager.disconnect(kind)` | Clear one slot |
//! | switch | `manager.switch_wallet(kind)` | Change the active wallet |
//! | pay | `manager.send_payment(dest, drops, memo)` | XRPL payment via GemWallet |
//! | stake | `manager.stake(amount)` / `unstake(amount)` | Staking contract calls |
//!
//! # Features
//!
//! - `native` - tokio scheduler, file storage, balance API server, CLI
//! - `wasm` - browser bindings (localStorage, injected providers, fetch)
//!
//! # Usage
//!
//! ```ignore
//! use std::rc::Rc;
//! use cribwallet::{MemoryStorage, SessionConfig, TokioScheduler, WalletManager, WalletPorts};
//!
//! let ports = WalletPorts::new(Rc::new(MemoryStorage::new()), Rc::new(TokioScheduler));
//! let manager = WalletManager::new(SessionConfig::testnet_demo(), ports);
//! manager.mount().await;
//! let address = manager.connect_metamask().await?;
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod provider;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod wallet;

// =============================================================================
// Native-only modules (server, CLI, tokio)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod server;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use config::{ChainParams, SessionConfig};
pub use crate::core::address::{classify, is_evm_address, is_xrpl_address, validate_xrpl_address, AddressKind};
pub use error::{WalletError, WalletResult};
pub use events::{SessionEvent, WalletSwitched};
pub use provider::{
    BalanceLookup, EvmProvider, LedgerWallet, ProviderAnnouncement, ProviderDiscovery, ProviderError,
    ProviderInfo, ProviderRegistry,
};
pub use runtime::{with_timeout, Scheduler, TaskHandle};
pub use session::{
    ActiveWallet, ConnectionStatus, HistoryEntry, SessionSnapshot, SwitchHistory, WalletKind,
    WalletSession,
};
pub use storage::{MemoryStorage, SessionStorage};
pub use wallet::{PageLocation, PaymentOutcome, StaticLocation, WalletManager, WalletPorts};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use logging::init_logging;
#[cfg(feature = "native")]
pub use provider::HttpBalanceLookup;
#[cfg(feature = "native")]
pub use runtime::{shutdown_signal, TokioScheduler};
#[cfg(feature = "native")]
pub use server::{create_router, create_router_with_name, XrplRpcClient};
#[cfg(feature = "native")]
pub use storage::FileStorage;

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::CribWallet;
