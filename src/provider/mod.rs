//! External wallet contracts
//!
//! Ports for the things the manager talks to but does not own: the injected
//! EVM provider, EIP-6963 discovery, the XRPL ledger wallet and the balance
//! fallback endpoint.

mod balance;
mod evm;
mod ledger;
mod registry;

pub use balance::{BalanceLookup, BalanceResponse};
#[cfg(feature = "native")]
pub use balance::HttpBalanceLookup;
pub use evm::{EvmProvider, ProviderError};
pub use ledger::{normalize, LedgerNetwork, LedgerWallet};
pub use registry::{ProviderAnnouncement, ProviderDiscovery, ProviderInfo, ProviderRegistry};
