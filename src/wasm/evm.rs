//! Injected EIP-1193 providers and EIP-6963 discovery

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::scheduler::BrowserScheduler;
use super::{js_error_message, to_js};
use crate::core::keys::events;
use crate::provider::{EvmProvider, ProviderAnnouncement, ProviderDiscovery, ProviderError, ProviderInfo};
use crate::runtime::Scheduler;

/// Wraps an object with an EIP-1193 `request({method, params})`.
#[derive(Clone)]
pub struct JsEvmProvider {
    inner: JsValue,
}

impl JsEvmProvider {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }
}

fn provider_error(value: &JsValue) -> ProviderError {
    let code = js_sys::Reflect::get(value, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64())
        .map(|c| c as i64);
    ProviderError { code, message: js_error_message(value) }
}

#[async_trait(?Send)]
impl EvmProvider for JsEvmProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let request = js_sys::Reflect::get(&self.inner, &JsValue::from_str("request"))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| ProviderError::uncoded("provider has no request()"))?;
        let args = to_js(&json!({ "method": method, "params": params }))
            .map_err(|e| provider_error(&e))?;

        let returned = request.call1(&self.inner, &args).map_err(|e| provider_error(&e))?;
        let resolved = match returned.dyn_into::<js_sys::Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(|e| provider_error(&e))?,
            Err(value) => value,
        };
        if resolved.is_undefined() || resolved.is_null() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(resolved)
            .map_err(|e| ProviderError::uncoded(format!("unreadable response: {e}")))
    }
}

/// `window.ethereum`, for wallets that predate EIP-6963.
pub fn legacy_provider() -> Option<Rc<dyn EvmProvider>> {
    let window = web_sys::window()?;
    let ethereum = js_sys::Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
    if ethereum.is_undefined() || ethereum.is_null() {
        return None;
    }
    Some(Rc::new(JsEvmProvider::new(ethereum)))
}

fn parse_announcement(event: &web_sys::Event) -> Option<ProviderAnnouncement> {
    let detail = event.dyn_ref::<web_sys::CustomEvent>()?.detail();
    let info = js_sys::Reflect::get(&detail, &JsValue::from_str("info")).ok()?;
    let info: ProviderInfo = serde_wasm_bindgen::from_value(info).ok()?;
    let provider = js_sys::Reflect::get(&detail, &JsValue::from_str("provider")).ok()?;
    if !provider.is_object() {
        return None;
    }
    Some(ProviderAnnouncement::new(info, Rc::new(JsEvmProvider::new(provider))))
}

/// Removes the announce listener when discovery ends or is dropped.
struct ListenerGuard {
    window: web_sys::Window,
    listener: Closure<dyn FnMut(web_sys::Event)>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            events::ANNOUNCE_PROVIDER,
            self.listener.as_ref().unchecked_ref(),
        );
    }
}

/// Collects `eip6963:announceProvider` answers for a short window.
#[derive(Debug, Clone)]
pub struct Eip6963Discovery {
    collect_for: Duration,
}

impl Default for Eip6963Discovery {
    fn default() -> Self {
        Self { collect_for: Duration::from_millis(250) }
    }
}

impl Eip6963Discovery {
    pub fn new(collect_for: Duration) -> Self {
        Self { collect_for }
    }
}

#[async_trait(?Send)]
impl ProviderDiscovery for Eip6963Discovery {
    async fn discover(&self) -> Vec<ProviderAnnouncement> {
        let Some(window) = web_sys::window() else {
            return Vec::new();
        };

        let found = Rc::new(RefCell::new(Vec::new()));
        let sink = found.clone();
        let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            if let Some(announcement) = parse_announcement(&event) {
                sink.borrow_mut().push(announcement);
            }
        });
        if window
            .add_event_listener_with_callback(events::ANNOUNCE_PROVIDER, listener.as_ref().unchecked_ref())
            .is_err()
        {
            return Vec::new();
        }
        let guard = ListenerGuard { window: window.clone(), listener };

        if let Ok(request) = web_sys::Event::new(events::REQUEST_PROVIDER) {
            let _ = window.dispatch_event(&request);
        }
        BrowserScheduler.sleep(self.collect_for).await;
        drop(guard);

        let announcements = found.borrow_mut().drain(..).collect();
        announcements
    }

    fn legacy_provider(&self) -> Option<Rc<dyn EvmProvider>> {
        legacy_provider()
    }
}
