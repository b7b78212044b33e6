//! EIP-6963 provider registry
//!
//! Providers are keyed by the UUID they announce. Discovery is awaited with an
//! explicit timeout instead of relying on a broadcast arriving "soon enough".

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::evm::EvmProvider;
use crate::runtime::{with_timeout, Scheduler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ProviderInfo {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self { uuid: uuid.into(), name: name.into(), rdns: None, icon: None }
    }

    pub fn with_rdns(mut self, rdns: impl Into<String>) -> Self {
        self.rdns = Some(rdns.into());
        self
    }
}

#[derive(Clone)]
pub struct ProviderAnnouncement {
    pub info: ProviderInfo,
    pub provider: Rc<dyn EvmProvider>,
}

impl ProviderAnnouncement {
    pub fn new(info: ProviderInfo, provider: Rc<dyn EvmProvider>) -> Self {
        Self { info, provider }
    }
}

/// Source of provider announcements (the `eip6963:*` event exchange in a
/// browser, a fixed list in tests).
#[async_trait(?Send)]
pub trait ProviderDiscovery {
    async fn discover(&self) -> Vec<ProviderAnnouncement>;

    /// The single pre-6963 injected provider, if any.
    fn legacy_provider(&self) -> Option<Rc<dyn EvmProvider>> {
        None
    }
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: RefCell<BTreeMap<String, ProviderAnnouncement>>,
    discovery: Option<Rc<dyn ProviderDiscovery>>,
    legacy: RefCell<Option<Rc<dyn EvmProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discovery(discovery: Rc<dyn ProviderDiscovery>) -> Self {
        Self { discovery: Some(discovery), ..Self::default() }
    }

    pub fn set_legacy(&self, provider: Rc<dyn EvmProvider>) {
        *self.legacy.borrow_mut() = Some(provider);
    }

    /// Register an announcement. A re-announcement replaces the earlier one.
    pub fn announce(&self, announcement: ProviderAnnouncement) {
        debug!(uuid = %announcement.info.uuid, name = %announcement.info.name, "provider announced");
        self.providers
            .borrow_mut()
            .insert(announcement.info.uuid.clone(), announcement);
    }

    /// Run discovery once, bounded by `timeout`. Returns the registry size.
    pub async fn refresh(&self, scheduler: &dyn Scheduler, timeout: Duration) -> usize {
        let Some(discovery) = self.discovery.clone() else {
            return self.len();
        };
        match with_timeout(scheduler, timeout, "provider discovery", discovery.discover()).await {
            Ok(found) => found.into_iter().for_each(|a| self.announce(a)),
            Err(e) => warn!(error = %e, "provider discovery did not finish"),
        }
        self.len()
    }

    /// Case-insensitive substring match on the announced name.
    pub fn find(&self, fragment: &str) -> Option<ProviderAnnouncement> {
        let needle = fragment.to_lowercase();
        self.providers
            .borrow()
            .values()
            .find(|a| a.info.name.to_lowercase().contains(&needle))
            .cloned()
    }

    pub fn legacy(&self) -> Option<Rc<dyn EvmProvider>> {
        if let Some(provider) = self.legacy.borrow().clone() {
            return Some(provider);
        }
        self.discovery.as_ref().and_then(|d| d.legacy_provider())
    }

    /// A provider matching `hint`, else the legacy injected provider.
    pub fn resolve(&self, hint: &str) -> Option<Rc<dyn EvmProvider>> {
        self.find(hint).map(|a| a.provider).or_else(|| self.legacy())
    }

    /// Like [`resolve`](Self::resolve), but re-runs discovery once when no
    /// announced provider matches.
    pub async fn locate(
        &self,
        hint: &str,
        scheduler: &dyn Scheduler,
        timeout: Duration,
    ) -> Option<Rc<dyn EvmProvider>> {
        if let Some(found) = self.find(hint) {
            return Some(found.provider);
        }
        self.refresh(scheduler, timeout).await;
        self.resolve(hint)
    }

    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.providers.borrow().values().map(|a| a.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.borrow().is_empty()
    }
}
