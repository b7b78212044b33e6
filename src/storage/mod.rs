//! Persistence port
//!
//! The manager stores two JSON documents: the session and the switch history.
//! Platforms provide the backing store:
//! - `MemoryStorage`: tests and ephemeral sessions
//! - `FileStorage`: one file per key (native)
//! - `wasm::LocalStorage`: `window.localStorage` (browser)

#[cfg(feature = "native")]
mod file;

#[cfg(feature = "native")]
pub use file::{default_root, FileStorage};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::WalletResult;

/// Key-value store for serialized session documents.
pub trait SessionStorage {
    fn get(&self, key: &str) -> WalletResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> WalletResult<()>;
    fn remove(&self, key: &str) -> WalletResult<()>;
    /// Remove every key this store owns.
    fn clear(&self) -> WalletResult<()>;
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> WalletResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> WalletResult<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> WalletResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> WalletResult<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_state() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set("walletSession", "{}").unwrap();
        assert_eq!(b.get("walletSession").unwrap().as_deref(), Some("{}"));
        b.remove("walletSession").unwrap();
        assert!(a.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let s = MemoryStorage::new();
        s.set("a", "1").unwrap();
        s.set("b", "2").unwrap();
        s.clear().unwrap();
        assert!(s.keys().is_empty());
        assert!(s.get("a").unwrap().is_none());
    }
}
