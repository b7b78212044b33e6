//! Balance API: the read-only endpoint the browser falls back to when the
//! ledger wallet cannot report a balance.

mod routes;
mod xrpl_rpc;

pub use routes::{create_router, create_router_with_name, ApiState};
pub use xrpl_rpc::{balance_from_account_info, BalanceSource, SourceError, XrplRpcClient};
