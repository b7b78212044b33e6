//! Balance fallback over `window.fetch`

use async_trait::async_trait;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::js_error_message;
use crate::error::{WalletError, WalletResult};
use crate::provider::{BalanceLookup, BalanceResponse};

#[derive(Debug, Clone)]
pub struct FetchBalanceLookup {
    endpoint: String,
}

impl FetchBalanceLookup {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

#[async_trait(?Send)]
impl BalanceLookup for FetchBalanceLookup {
    async fn lookup(&self, address: &str) -> WalletResult<String> {
        let failed = |e: wasm_bindgen::JsValue| WalletError::BalanceLookup(js_error_message(&e));
        let window = web_sys::window().ok_or_else(|| WalletError::BalanceLookup("no window".into()))?;

        let address = String::from(js_sys::encode_uri_component(address));
        let url = format!("{}?address={address}", self.endpoint);
        let response: web_sys::Response = JsFuture::from(window.fetch_with_str(&url))
            .await
            .map_err(failed)?
            .dyn_into()
            .map_err(failed)?;
        let json = JsFuture::from(response.json().map_err(failed)?).await.map_err(failed)?;
        let body: BalanceResponse = serde_wasm_bindgen::from_value(json)
            .map_err(|e| WalletError::BalanceLookup(format!("bad response: {e}")))?;
        body.into_result()
    }
}
