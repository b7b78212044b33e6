//! CribWallet: the wallet session exposed to the page
//!
//! One instance per page. State changes reach JS through `onChange`
//! callbacks; wallet switches are also dispatched on `window` as a
//! `walletSwitched` CustomEvent.

use std::rc::Rc;
use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use super::{log, to_js};
use super::{BrowserScheduler, Eip6963Discovery, FetchBalanceLookup, JsLedgerWallet, LocalStorage, WindowLocation};
use crate::config::SessionConfig;
use crate::core::keys::events;
use crate::events::{SessionEvent, WalletSwitched};
use crate::provider::ProviderRegistry;
use crate::session::WalletKind;
use crate::wallet::{WalletManager, WalletPorts};

/// Plain options accepted by the constructor. `gemWallet` is read separately
/// since it is a live JS object.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CribWalletOptions {
    demo: bool,
    balance_endpoint: Option<String>,
    provider_hint: Option<String>,
    refresh_seconds: Option<u32>,
    storage_prefix: Option<String>,
}

fn parse_kind(kind: &str) -> Result<WalletKind, JsValue> {
    WalletKind::from_str(kind).ok_or_else(|| JsValue::from_str(&format!("unknown wallet: {kind}")))
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn dispatch_switched(switched: &WalletSwitched) {
    let Some(window) = web_sys::window() else { return };
    let Ok(detail) = to_js(switched) else { return };
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&detail);
    match web_sys::CustomEvent::new_with_event_init_dict(events::WALLET_SWITCHED, &init) {
        Ok(event) => {
            let _ = window.dispatch_event(&event);
        }
        Err(e) => log!("[CribWallet] Failed to build {}: {:?}", events::WALLET_SWITCHED, e),
    }
}

#[wasm_bindgen]
pub struct CribWallet {
    manager: WalletManager,
}

#[wasm_bindgen]
impl CribWallet {
    /// `options`: `{ demo?, balanceEndpoint?, providerHint?, refreshSeconds?,
    /// storagePrefix?, gemWallet? }`
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<CribWallet, JsValue> {
        let parsed: CribWalletOptions = if options.is_undefined() || options.is_null() {
            CribWalletOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options.clone()).map_err(js_err)?
        };

        let mut config = if parsed.demo { SessionConfig::testnet_demo() } else { SessionConfig::new() };
        if let Some(hint) = parsed.provider_hint {
            config = config.with_evm_provider_hint(hint);
        }
        if let Some(secs) = parsed.refresh_seconds.filter(|s| *s > 0) {
            config = config.with_refresh_interval(Duration::from_secs(secs as u64));
        }

        let storage = match parsed.storage_prefix {
            Some(prefix) => LocalStorage::with_prefix(prefix),
            None => LocalStorage::default(),
        };
        let registry = ProviderRegistry::with_discovery(Rc::new(Eip6963Discovery::default()));
        let mut ports = WalletPorts::new(Rc::new(storage), Rc::new(BrowserScheduler))
            .with_registry(Rc::new(registry))
            .with_location(Rc::new(WindowLocation));

        if let Some(endpoint) = parsed.balance_endpoint {
            ports = ports.with_balance_lookup(Rc::new(FetchBalanceLookup::new(endpoint.clone())));
            config = config.with_balance_endpoint(endpoint);
        }
        if !options.is_undefined() && !options.is_null() {
            let gem = js_sys::Reflect::get(&options, &JsValue::from_str("gemWallet"))?;
            if gem.is_object() {
                ports = ports.with_ledger(Rc::new(JsLedgerWallet::new(gem)));
            }
        }

        let manager = WalletManager::new(config, ports);
        let mut switches = manager.subscribe();
        spawn_local(async move {
            while let Some(event) = switches.next().await {
                if let SessionEvent::Switched(switched) = event {
                    dispatch_switched(&switched);
                }
            }
        });

        log!("[CribWallet] Created");
        Ok(CribWallet { manager })
    }

    /// Hydrate, discover wallets and silently restore the last session.
    pub async fn mount(&self) -> Result<JsValue, JsValue> {
        self.manager.mount().await;
        to_js(&self.manager.snapshot())
    }

    #[wasm_bindgen(js_name = "connectMetamask")]
    pub async fn connect_metamask(&self) -> Result<String, JsValue> {
        self.manager.connect_metamask().await.map_err(js_err)
    }

    #[wasm_bindgen(js_name = "connectGem")]
    pub async fn connect_gem(&self) -> Result<String, JsValue> {
        self.manager.connect_gem().await.map_err(js_err)
    }

    pub fn disconnect(&self, kind: &str) -> Result<(), JsValue> {
        self.manager.disconnect(parse_kind(kind)?);
        Ok(())
    }

    /// Forget both wallets and the switch history.
    pub fn reset(&self) {
        self.manager.reset();
    }

    #[wasm_bindgen(js_name = "switchWallet")]
    pub fn switch_wallet(&self, kind: &str) -> Result<JsValue, JsValue> {
        let switched = self.manager.switch_wallet(parse_kind(kind)?).map_err(js_err)?;
        to_js(&switched)
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.manager.snapshot())
    }

    pub fn history(&self) -> Result<JsValue, JsValue> {
        to_js(&self.manager.history())
    }

    /// Announced EIP-6963 providers.
    pub fn providers(&self) -> Result<JsValue, JsValue> {
        to_js(&self.manager.providers())
    }

    /// Always resolves to `{ success, hash?, error? }`.
    #[wasm_bindgen(js_name = "sendPayment")]
    pub async fn send_payment(&self, destination: &str, amount: &str, memo: Option<String>) -> Result<JsValue, JsValue> {
        let outcome = self.manager.send_payment(destination, amount, memo.as_deref()).await;
        to_js(&outcome)
    }

    pub async fn stake(&self, amount: &str) -> Result<String, JsValue> {
        self.manager.stake(amount).await.map_err(js_err)
    }

    pub async fn unstake(&self, amount: &str) -> Result<String, JsValue> {
        self.manager.unstake(amount).await.map_err(js_err)
    }

    #[wasm_bindgen(js_name = "refreshBalances")]
    pub async fn refresh_balances(&self) -> Result<JsValue, JsValue> {
        self.manager.refresh_balances().await;
        to_js(&self.manager.snapshot())
    }

    /// Call `callback(snapshot)` after every state change.
    #[wasm_bindgen(js_name = "onChange")]
    pub fn on_change(&self, callback: js_sys::Function) {
        let mut updates = self.manager.subscribe();
        spawn_local(async move {
            while let Some(event) = updates.next().await {
                if let SessionEvent::Updated(snapshot) = event {
                    let Ok(value) = to_js(&snapshot) else { continue };
                    if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                        log!("[CribWallet] onChange callback threw: {:?}", e);
                    }
                }
            }
        });
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use std::cell::RefCell;

    use chrono::{TimeZone, Utc};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    use super::*;
    use crate::session::ActiveWallet;

    wasm_bindgen_test_configure!(run_in_browser);

    fn field(value: &JsValue, name: &str) -> Option<String> {
        js_sys::Reflect::get(value, &JsValue::from_str(name)).ok()?.as_string()
    }

    #[wasm_bindgen_test]
    fn switch_is_dispatched_on_window() {
        let window = web_sys::window().unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let event: web_sys::CustomEvent = event.unchecked_into();
            sink.borrow_mut().push(event.detail());
        });
        window
            .add_event_listener_with_callback(events::WALLET_SWITCHED, listener.as_ref().unchecked_ref())
            .unwrap();

        dispatch_switched(&WalletSwitched {
            previous_wallet: ActiveWallet::Metamask,
            new_wallet: WalletKind::Gem,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        });
        window
            .remove_event_listener_with_callback(events::WALLET_SWITCHED, listener.as_ref().unchecked_ref())
            .unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(field(&seen[0], "previousWallet").as_deref(), Some("metamask"));
        assert_eq!(field(&seen[0], "newWallet").as_deref(), Some("gem"));
        assert_eq!(field(&seen[0], "timestamp").as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[wasm_bindgen_test]
    fn first_switch_reports_none_as_previous() {
        let detail = to_js(&WalletSwitched {
            previous_wallet: ActiveWallet::None,
            new_wallet: WalletKind::Metamask,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        })
        .unwrap();
        assert_eq!(field(&detail, "previousWallet").as_deref(), Some("none"));
        assert_eq!(field(&detail, "newWallet").as_deref(), Some("metamask"));
    }
}
