//! WASM module: the wallet session manager in the browser
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           CribWallet (JS API)           │
//! │  mount, connect*, switch, sendPayment   │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │             WalletManager               │
//! │  session, history, refresh loop         │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │            Browser adapters             │
//! │  JsEvmProvider / Eip6963Discovery       │
//! │  JsLedgerWallet / FetchBalanceLookup    │
//! │  LocalStorage / BrowserScheduler        │
//! └─────────────────────────────────────────┘
//! ```

mod evm;
mod fetch;
mod gem;
mod scheduler;
mod session;
mod storage;

pub use evm::{legacy_provider, Eip6963Discovery, JsEvmProvider};
pub use fetch::FetchBalanceLookup;
pub use gem::JsLedgerWallet;
pub use scheduler::{BrowserScheduler, WindowLocation};
pub use session::CribWallet;
pub use storage::LocalStorage;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_web::MakeWebConsoleWriter;
use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    init_console_logging();
}

/// Send `tracing` events to the browser console. A second call keeps the
/// subscriber already installed.
pub fn init_console_logging() {
    let console = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        // No clock for the formatter in the browser
        .without_time()
        .with_writer(MakeWebConsoleWriter::new());
    let installed = tracing_subscriber::registry()
        .with(LevelFilter::DEBUG)
        .with(console)
        .try_init();
    if installed.is_err() {
        console_log("[CribWallet] tracing subscriber already installed");
    }
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;

/// Best-effort text for a thrown JS value.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Serialize for JS with plain objects and `null` for missing values.
pub(crate) fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new()
        .serialize_maps_as_objects(true)
        .serialize_missing_as_null(true);
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
