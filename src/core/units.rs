//! Unit conversion between on-chain integers and display strings
//!
//! Balances arrive as hex wei (EVM) or integer drops (XRPL) and leave as
//! decimal strings. Amounts typed by a user go the other way. All arithmetic
//! is integer; nothing passes through `f64`.

use crate::error::{WalletError, WalletResult};

/// Decimals of the EVM native currency
pub const WEI_DECIMALS: u32 = 18;
/// Decimals of XRP on the ledger
pub const DROP_DECIMALS: u32 = 6;
/// Digits shown for EVM balances
pub const DISPLAY_PRECISION: u32 = 4;

/// Parse an EIP-1474 quantity (`"0x1bc16d674ec80000"`).
pub fn parse_hex_quantity(raw: &str) -> WalletResult<u128> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| WalletError::MalformedResponse(format!("quantity {raw:?}: {e}")))
}

pub fn to_hex_quantity(value: u128) -> String {
    format!("{value:#x}")
}

/// Render `value / 10^decimals` with exactly `precision` fractional digits,
/// rounding half up.
pub fn format_units(value: u128, decimals: u32, precision: u32) -> String {
    let shown = precision.min(decimals);
    let scale = 10u128.pow(decimals - shown);
    let remainder = value % scale;
    let rounded = value / scale + u128::from(remainder * 2 >= scale && scale > 1);

    let unit = 10u128.pow(shown);
    let whole = rounded / unit;
    let frac = rounded % unit;

    let mut out = if shown == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{frac:0width$}", width = shown as usize)
    };
    if precision > shown {
        if shown == 0 {
            out.push('.');
        }
        out.extend(std::iter::repeat('0').take((precision - shown) as usize));
    }
    out
}

/// Wei to the 4-digit display string used for EVM balances.
pub fn format_wei(wei: u128) -> String {
    format_units(wei, WEI_DECIMALS, DISPLAY_PRECISION)
}

/// Drops to XRP with trailing zeros trimmed (`12500000` -> `"12.5"`).
pub fn format_drops(drops: u128) -> String {
    let full = format_units(drops, DROP_DECIMALS, DROP_DECIMALS);
    let trimmed = full.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Parse a decimal amount (`"1.5"`) into base units.
pub fn parse_units(text: &str, decimals: u32) -> WalletResult<u128> {
    let text = text.trim();
    if text.is_empty() {
        return Err(WalletError::InvalidAmount("amount is empty".into()));
    }
    if text.starts_with('-') {
        return Err(WalletError::InvalidAmount("amount must be positive".into()));
    }

    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(WalletError::InvalidAmount(format!("{text:?} is not a number")));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(WalletError::InvalidAmount(format!("{text:?} is not a number")));
    }
    if frac_part.len() > decimals as usize {
        return Err(WalletError::InvalidAmount(format!(
            "{text:?} has more than {decimals} decimal places"
        )));
    }

    let too_large = || WalletError::InvalidAmount(format!("{text:?} is too large"));
    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| too_large())?
    };
    let frac: u128 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{frac_part:0<width$}", width = decimals as usize);
        padded.parse().map_err(|_| too_large())?
    };

    whole
        .checked_mul(10u128.pow(decimals))
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(too_large)
}

/// Parse a decimal amount and require it to be strictly positive.
pub fn parse_positive_units(text: &str, decimals: u32) -> WalletResult<u128> {
    match parse_units(text, decimals)? {
        0 => Err(WalletError::InvalidAmount("amount must be greater than zero".into())),
        value => Ok(value),
    }
}
