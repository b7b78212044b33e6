//! Platform-neutral helpers: storage keys, unit conversion, address checks.

pub mod address;
pub mod keys;
pub mod units;
