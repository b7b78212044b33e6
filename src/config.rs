//! Session configuration - passed from the host page or the CLI

use std::time::Duration;

use serde_json::{json, Value};

use crate::core::keys::storage;
use crate::core::units;
use crate::session::DEFAULT_HISTORY_LIMIT;

pub const XRPL_EVM_TESTNET_CHAIN_ID: u64 = 1_449_000;
pub const XRPL_EVM_TESTNET_RPC: &str = "https://rpc.testnet.xrplevm.org";
pub const XRPL_EVM_TESTNET_EXPLORER: &str = "https://explorer.testnet.xrplevm.org";
pub const XRPL_TESTNET_JSON_RPC: &str = "https://s.altnet.rippletest.net:51234";
pub const DEFAULT_STAKING_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const DEMO_BALANCE: &str = "0.1250";

/// Target EVM chain, in the shape `wallet_addEthereumChain` wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub chain_id: u64,
    pub chain_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub decimals: u32,
    pub rpc_urls: Vec<String>,
    pub explorer_urls: Vec<String>,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::xrpl_evm_testnet()
    }
}

impl ChainParams {
    pub fn xrpl_evm_testnet() -> Self {
        Self {
            chain_id: XRPL_EVM_TESTNET_CHAIN_ID,
            chain_name: "XRPL EVM Sidechain Testnet".into(),
            currency_name: "XRP".into(),
            currency_symbol: "XRP".into(),
            decimals: units::WEI_DECIMALS,
            rpc_urls: vec![XRPL_EVM_TESTNET_RPC.into()],
            explorer_urls: vec![XRPL_EVM_TESTNET_EXPLORER.into()],
        }
    }

    pub fn chain_id_hex(&self) -> String {
        units::to_hex_quantity(u128::from(self.chain_id))
    }

    /// Params for `wallet_switchEthereumChain`.
    pub fn switch_chain_params(&self) -> Value {
        json!([{ "chainId": self.chain_id_hex() }])
    }

    /// Params for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> Value {
        json!([{
            "chainId": self.chain_id_hex(),
            "chainName": self.chain_name,
            "nativeCurrency": {
                "name": self.currency_name,
                "symbol": self.currency_symbol,
                "decimals": self.decimals,
            },
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.explorer_urls,
        }])
    }
}

/// Wallet session configuration. Higher layers construct this.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub chain: ChainParams,
    /// Substring matched against announced provider names
    pub evm_provider_hint: String,
    pub request_timeout: Duration,
    pub balance_timeout: Duration,
    pub install_check_timeout: Duration,
    pub address_timeout: Duration,
    pub ledger_timeout: Duration,
    pub transaction_timeout: Duration,
    pub discovery_timeout: Duration,
    pub refresh_interval: Duration,
    pub history_limit: usize,
    /// Shown instead of a zero EVM balance. Demo builds only.
    pub demo_balance: Option<String>,
    pub session_key: String,
    pub history_key: String,
    pub balance_endpoint: Option<String>,
    pub staking_contract: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chain: ChainParams::default(),
            evm_provider_hint: "MetaMask".into(),
            request_timeout: Duration::from_secs(15),
            balance_timeout: Duration::from_secs(15),
            install_check_timeout: Duration::from_secs(3),
            address_timeout: Duration::from_secs(5),
            ledger_timeout: Duration::from_secs(5),
            transaction_timeout: Duration::from_secs(120),
            discovery_timeout: Duration::from_millis(500),
            refresh_interval: Duration::from_secs(30),
            history_limit: DEFAULT_HISTORY_LIMIT,
            demo_balance: None,
            session_key: storage::SESSION.into(),
            history_key: storage::HISTORY.into(),
            balance_endpoint: None,
            staking_contract: DEFAULT_STAKING_CONTRACT.into(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self { Self::default() }

    /// Testnet with the demo balance substituted for empty EVM accounts.
    pub fn testnet_demo() -> Self { Self::default().with_demo_balance(DEMO_BALANCE) }

    pub fn with_chain(mut self, chain: ChainParams) -> Self { self.chain = chain; self }
    pub fn with_evm_provider_hint(mut self, hint: impl Into<String>) -> Self { self.evm_provider_hint = hint.into(); self }
    pub fn with_request_timeout(mut self, t: Duration) -> Self { self.request_timeout = t; self }
    pub fn with_balance_timeout(mut self, t: Duration) -> Self { self.balance_timeout = t; self }
    pub fn with_install_check_timeout(mut self, t: Duration) -> Self { self.install_check_timeout = t; self }
    pub fn with_address_timeout(mut self, t: Duration) -> Self { self.address_timeout = t; self }
    pub fn with_ledger_timeout(mut self, t: Duration) -> Self { self.ledger_timeout = t; self }
    pub fn with_transaction_timeout(mut self, t: Duration) -> Self { self.transaction_timeout = t; self }
    pub fn with_discovery_timeout(mut self, t: Duration) -> Self { self.discovery_timeout = t; self }
    pub fn with_refresh_interval(mut self, t: Duration) -> Self { self.refresh_interval = t; self }
    pub fn with_history_limit(mut self, n: usize) -> Self { self.history_limit = n; self }
    pub fn with_demo_balance(mut self, b: impl Into<String>) -> Self { self.demo_balance = Some(b.into()); self }
    pub fn with_storage_keys(mut self, session: impl Into<String>, history: impl Into<String>) -> Self {
        self.session_key = session.into();
        self.history_key = history.into();
        self
    }
    pub fn with_balance_endpoint(mut self, url: impl Into<String>) -> Self { self.balance_endpoint = Some(url.into()); self }
    pub fn with_staking_contract(mut self, addr: impl Into<String>) -> Self { self.staking_contract = addr.into(); self }
}
