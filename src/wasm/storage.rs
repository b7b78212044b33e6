//! `window.localStorage` with a key prefix

use crate::core::keys::storage::PREFIX;
use crate::error::{WalletError, WalletResult};
use crate::storage::SessionStorage;

use super::js_error_message;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    prefix: String,
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::with_prefix(PREFIX)
    }
}

impl LocalStorage {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn storage(&self) -> WalletResult<web_sys::Storage> {
        web_sys::window()
            .ok_or_else(|| WalletError::Storage("no window".into()))?
            .local_storage()
            .map_err(|e| WalletError::Storage(js_error_message(&e)))?
            .ok_or_else(|| WalletError::Storage("localStorage unavailable".into()))
    }

    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl SessionStorage for LocalStorage {
    fn get(&self, key: &str) -> WalletResult<Option<String>> {
        self.storage()?
            .get_item(&self.key(key))
            .map_err(|e| WalletError::Storage(js_error_message(&e)))
    }

    fn set(&self, key: &str, value: &str) -> WalletResult<()> {
        self.storage()?
            .set_item(&self.key(key), value)
            .map_err(|e| WalletError::Storage(js_error_message(&e)))
    }

    fn remove(&self, key: &str) -> WalletResult<()> {
        self.storage()?
            .remove_item(&self.key(key))
            .map_err(|e| WalletError::Storage(js_error_message(&e)))
    }

    fn clear(&self) -> WalletResult<()> {
        let storage = self.storage()?;
        let len = storage.length().map_err(|e| WalletError::Storage(js_error_message(&e)))?;
        let owned: Vec<String> = (0..len)
            .filter_map(|i| storage.key(i).ok().flatten())
            .filter(|k| k.starts_with(&self.prefix))
            .collect();
        for key in owned {
            storage
                .remove_item(&key)
                .map_err(|e| WalletError::Storage(js_error_message(&e)))?;
        }
        Ok(())
    }
}
