//! GemWallet API adapter

use async_trait::async_trait;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::{js_error_message, to_js};
use crate::core::keys::gem;
use crate::error::{WalletError, WalletResult};
use crate::provider::{normalize, LedgerNetwork, LedgerWallet};

/// Wraps the GemWallet API object handed over by the page.
#[derive(Clone)]
pub struct JsLedgerWallet {
    api: JsValue,
}

impl JsLedgerWallet {
    pub fn new(api: JsValue) -> Self {
        Self { api }
    }

    /// Call `api[method](arg?)`, awaiting a returned promise. `None` when the
    /// API has no such method.
    async fn call(&self, method: &str, arg: Option<Value>) -> WalletResult<Option<Value>> {
        let function = match js_sys::Reflect::get(&self.api, &JsValue::from_str(method))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        {
            Some(f) => f,
            None => return Ok(None),
        };
        let js_error = |e: JsValue| WalletError::Provider { code: None, message: js_error_message(&e) };

        let returned = match arg {
            Some(arg) => function.call1(&self.api, &to_js(&arg).map_err(js_error)?),
            None => function.call0(&self.api),
        }
        .map_err(js_error)?;
        let resolved = match returned.dyn_into::<js_sys::Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(js_error)?,
            Err(value) => value,
        };
        if resolved.is_undefined() || resolved.is_null() {
            return Ok(Some(Value::Null));
        }
        serde_wasm_bindgen::from_value(resolved)
            .map(Some)
            .map_err(|e| WalletError::MalformedResponse(e.to_string()))
    }
}

#[async_trait(?Send)]
impl LedgerWallet for JsLedgerWallet {
    async fn is_installed(&self) -> WalletResult<bool> {
        Ok(self
            .call(gem::IS_INSTALLED, None)
            .await?
            .is_some_and(|v| normalize::install_flag(&v)))
    }

    async fn get_address(&self) -> WalletResult<Option<String>> {
        let raw = self.call(gem::GET_ADDRESS, None).await?;
        match raw {
            Some(v) if normalize::is_rejected(&v) => Err(WalletError::UserRejected),
            Some(v) => Ok(normalize::address(&v)),
            None => Ok(None),
        }
    }

    async fn get_network(&self) -> WalletResult<Option<LedgerNetwork>> {
        Ok(self.call(gem::GET_NETWORK, None).await?.and_then(|v| normalize::network(&v)))
    }

    async fn get_balance(&self) -> WalletResult<Option<String>> {
        Ok(self.call(gem::GET_BALANCE, None).await?.and_then(|v| normalize::balance(&v)))
    }

    async fn submit_transaction(&self, tx: Value) -> WalletResult<Option<String>> {
        let raw = self
            .call(gem::SUBMIT_TRANSACTION, Some(json!({ "transaction": tx })))
            .await?
            .ok_or_else(|| WalletError::PaymentFailed("wallet cannot submit transactions".into()))?;
        if normalize::is_rejected(&raw) {
            return Err(WalletError::UserRejected);
        }
        Ok(normalize::hash(&raw))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use wasm_bindgen_test::*;

    use super::*;

    /// API object whose methods run the given bodies with one `arg`.
    fn api(methods: &[(&str, &str)]) -> JsLedgerWallet {
        let object = js_sys::Object::new();
        for (name, body) in methods {
            let function = js_sys::Function::new_with_args("arg", body);
            js_sys::Reflect::set(&object, &JsValue::from_str(name), &function).unwrap();
        }
        JsLedgerWallet::new(object.into())
    }

    #[wasm_bindgen_test]
    async fn address_refusal_is_user_rejected() {
        let wallet = api(&[("getAddress", "return Promise.resolve({ type: 'reject' })")]);
        assert!(matches!(wallet.get_address().await, Err(WalletError::UserRejected)));
    }

    #[wasm_bindgen_test]
    async fn payment_refusal_is_user_rejected() {
        let wallet = api(&[("submitTransaction", "return Promise.resolve({ type: 'reject' })")]);
        let result = wallet.submit_transaction(json!({ "TransactionType": "Payment" })).await;
        assert!(matches!(result, Err(WalletError::UserRejected)));
    }

    #[wasm_bindgen_test]
    async fn submit_wraps_transaction_and_reads_hash() {
        let wallet = api(&[(
            "submitTransaction",
            "return Promise.resolve({ type: 'response', result: { hash: arg.transaction.TransactionType + '-HASH' } })",
        )]);
        let hash = wallet.submit_transaction(json!({ "TransactionType": "Payment" })).await.unwrap();
        assert_eq!(hash.as_deref(), Some("Payment-HASH"));
    }

    #[wasm_bindgen_test]
    async fn missing_methods_read_as_absent() {
        let wallet = api(&[]);
        assert!(!wallet.is_installed().await.unwrap());
        assert_eq!(wallet.get_address().await.unwrap(), None);
        assert!(matches!(
            wallet.submit_transaction(json!({})).await,
            Err(WalletError::PaymentFailed(_))
        ));
    }
}
