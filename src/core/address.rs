//! Address shape checks
//!
//! These are shape checks only: prefix, length and alphabet. Checksums are
//! left to the wallet that signs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{WalletError, WalletResult};

pub const XRPL_MIN_LEN: usize = 25;
pub const XRPL_MAX_LEN: usize = 35;

// Ripple base58 uses the same characters as Bitcoin's, in a different order.
static XRPL_CLASSIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^r[1-9A-HJ-NP-Za-km-z]{24,34}$").expect("xrpl address regex"));
static EVM_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("evm address regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Xrpl,
    Evm,
}

/// Validate an XRPL classic address, explaining the first rule it breaks.
pub fn validate_xrpl_address(address: &str) -> WalletResult<()> {
    let address = address.trim();
    if address.is_empty() {
        return Err(WalletError::InvalidAddress("destination address is required".into()));
    }
    if !address.starts_with('r') {
        return Err(WalletError::InvalidAddress(format!(
            "{address} must start with 'r'"
        )));
    }
    if !(XRPL_MIN_LEN..=XRPL_MAX_LEN).contains(&address.len()) {
        return Err(WalletError::InvalidAddress(format!(
            "{address} must be {XRPL_MIN_LEN}-{XRPL_MAX_LEN} characters long"
        )));
    }
    if !XRPL_CLASSIC.is_match(address) {
        return Err(WalletError::InvalidAddress(format!(
            "{address} contains characters outside the base58 alphabet"
        )));
    }
    Ok(())
}

pub fn is_xrpl_address(address: &str) -> bool {
    validate_xrpl_address(address).is_ok()
}

pub fn is_evm_address(address: &str) -> bool {
    EVM_ADDRESS.is_match(address.trim())
}

pub fn classify(address: &str) -> Option<AddressKind> {
    if is_xrpl_address(address) {
        Some(AddressKind::Xrpl)
    } else if is_evm_address(address) {
        Some(AddressKind::Evm)
    } else {
        None
    }
}
