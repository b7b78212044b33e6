//! Key and name constants shared by the manager and the platform adapters
//!
//! Centralized registry for storage keys, browser event names and the
//! wallet RPC methods the manager speaks.

/// Persisted storage keys
pub mod storage {
    /// Prefix applied by the browser `localStorage` adapter
    pub const PREFIX: &str = "cryptoCribs.";
    pub const SESSION: &str = "walletSession";
    pub const HISTORY: &str = "walletHistory";
}

/// Browser events
pub mod events {
    pub const WALLET_SWITCHED: &str = "walletSwitched";
    pub const ANNOUNCE_PROVIDER: &str = "eip6963:announceProvider";
    pub const REQUEST_PROVIDER: &str = "eip6963:requestProvider";
}

/// EIP-1193 methods
pub mod evm {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const GET_BALANCE: &str = "eth_getBalance";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";

    /// `stake()`
    pub const STAKE_SELECTOR: &str = "0x3a4b66f1";
    /// `unstake(uint256)`
    pub const UNSTAKE_SELECTOR: &str = "0x2e17de78";
}

/// EIP-1193 / EIP-1474 error codes
pub mod codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const REQUEST_PENDING: i64 = -32002;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// GemWallet API surface
pub mod gem {
    pub const IS_INSTALLED: &str = "isInstalled";
    pub const GET_ADDRESS: &str = "getAddress";
    pub const GET_NETWORK: &str = "getNetwork";
    pub const GET_BALANCE: &str = "getBalance";
    pub const SUBMIT_TRANSACTION: &str = "submitTransaction";
}

/// HTTP routes served by the balance API
pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const XRPL_BALANCE: &str = "/api/xrpl/balance";
}
